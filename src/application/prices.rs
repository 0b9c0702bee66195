use std::sync::Arc;

use crate::domain::models::{Price, PriceCache};
use crate::infrastructure::bc_client::BcClient;

/// Resolves BTC/USD prices, serving historical prices from the cache when
/// possible. Failures never propagate: they are logged and reported as
/// [`Price::Unavailable`].
pub struct PriceFetcher<C, P> {
    bc_client: C,
    cache: Arc<P>,
}

impl<C: Clone, P> Clone for PriceFetcher<C, P> {
    fn clone(&self) -> Self {
        Self {
            bc_client: self.bc_client.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<C, P> PriceFetcher<C, P>
where
    C: BcClient + Send + Sync,
    P: PriceCache + Send + Sync,
{
    pub fn new(bc_client: C, cache: Arc<P>) -> Self {
        Self { bc_client, cache }
    }

    pub async fn latest_price(&self) -> Price {
        match self.bc_client.latest_price().await {
            Ok(price) => Price::Available(price),
            Err(e) => {
                tracing::error!("Failed to fetch the latest price: {}", e);
                Price::Unavailable
            }
        }
    }

    pub async fn historical_price(&self, timestamp: i64) -> Price {
        if let Some(price) = self.cache.get(timestamp).filter(|price| *price > 0.0) {
            tracing::debug!("Price cache hit for timestamp {}", timestamp);
            return Price::Available(price);
        }

        match self.bc_client.historical_price(timestamp).await {
            Ok(price) => {
                if price > 0.0 {
                    self.cache.set(timestamp, price);
                }
                Price::Available(price)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to fetch historical price for timestamp {}: {}",
                    timestamp,
                    e
                );
                Price::Unavailable
            }
        }
    }
}
