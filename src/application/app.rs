use std::sync::Arc;
use std::time::Duration;

use super::aggregator::AddressAggregator;
use super::prices::PriceFetcher;
use super::Aggregator;
use crate::domain::errors::{AggregatorError, BcClientError};
use crate::domain::models::{
    AddressSummary, EnrichedTransaction, PriceCache, SearchQuery, SearchResults,
};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::mempool_client::{MempoolClient, DEFAULT_EXPLORER_URL};
use crate::infrastructure::memory::{InMemoryPriceCache, DEFAULT_PRICE_TTL_SECS};
use crate::infrastructure::shutdown::{Shutdown, ShutdownChannel};
use typed_builder::TypedBuilder;

/// Settings of the running service, usually taken from the command line.
#[derive(Clone, Debug, TypedBuilder)]
pub struct AppConfig {
    #[builder(default = DEFAULT_EXPLORER_URL.to_string(), setter(into))]
    pub explorer_url: String,
    #[builder(default = 3)]
    pub num_retries: usize,
    #[builder(default = 100)]
    pub retry_backoff_ms: u64,
    #[builder(default = DEFAULT_PRICE_TTL_SECS)]
    pub price_cache_ttl_secs: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Application {
    async fn run_cache_sweeper(&self, interval: Duration, shutdown: ShutdownChannel);
    async fn address_summary(&self, address: &str) -> Result<AddressSummary, AggregatorError>;
    async fn transaction_detail(
        &self,
        address: &str,
        txid: &str,
    ) -> Result<EnrichedTransaction, AggregatorError>;
    async fn search(&self, query: SearchQuery) -> Result<SearchResults, AggregatorError>;
}

pub type MempoolAggregator = AddressAggregator<MempoolClient, InMemoryPriceCache<SystemClock>>;

pub struct App<A, P> {
    aggregator: Arc<A>,
    price_cache: Arc<P>,
}

impl<A, P> Clone for App<A, P> {
    fn clone(&self) -> Self {
        Self {
            aggregator: self.aggregator.clone(),
            price_cache: self.price_cache.clone(),
        }
    }
}

impl App<MempoolAggregator, InMemoryPriceCache<SystemClock>> {
    pub fn new(config: &AppConfig) -> Result<Self, BcClientError> {
        let bc_client = MempoolClient::new(
            &config.explorer_url,
            config.num_retries,
            config.retry_backoff_ms,
        )?;
        let price_cache = Arc::new(InMemoryPriceCache::new(
            config.price_cache_ttl_secs,
            SystemClock,
        ));
        let aggregator = AddressAggregator::builder()
            .bc_client(bc_client.clone())
            .prices(PriceFetcher::new(bc_client, price_cache.clone()))
            .build();
        tracing::info!("Using explorer at {}", config.explorer_url);
        Ok(Self::from_parts(Arc::new(aggregator), price_cache))
    }
}

impl<A, P> App<A, P> {
    pub fn from_parts(aggregator: Arc<A>, price_cache: Arc<P>) -> Self {
        Self {
            aggregator,
            price_cache,
        }
    }
}

#[async_trait::async_trait]
impl<A, P> Application for App<A, P>
where
    A: Aggregator + Send + Sync + 'static,
    P: PriceCache + Send + Sync + 'static,
{
    async fn run_cache_sweeper(&self, interval: Duration, shutdown: ShutdownChannel) {
        let mut shutdown = shutdown.subscribe();
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;
        tracing::info!("Running price cache sweeper every {:?}", interval);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Received shutdown signal, stopping cache sweeper");
                    break;
                }
                _ = ticker.tick() => {
                    let purged = self.price_cache.purge_expired();
                    if purged > 0 {
                        tracing::debug!("Purged {} expired prices", purged);
                    }
                }
            }
        }
    }

    async fn address_summary(&self, address: &str) -> Result<AddressSummary, AggregatorError> {
        self.aggregator.address_summary(address).await
    }

    async fn transaction_detail(
        &self,
        address: &str,
        txid: &str,
    ) -> Result<EnrichedTransaction, AggregatorError> {
        self.aggregator.transaction_detail(address, txid).await
    }

    async fn search(&self, query: SearchQuery) -> Result<SearchResults, AggregatorError> {
        match (query.address(), query.txid()) {
            (Some(address), Some(txid)) => {
                let transaction = self.aggregator.transaction_detail(address, txid).await?;
                Ok(SearchResults {
                    address: Some(address.to_string()),
                    transactions: vec![transaction],
                    ..Default::default()
                })
            }
            (Some(address), None) => {
                let summary = self.aggregator.address_summary(address).await?;
                Ok(SearchResults {
                    address: Some(summary.address),
                    transactions: summary.transactions,
                    current_balance: summary.current_balance,
                    current_price_balance: summary.current_price_balance,
                })
            }
            _ => Ok(SearchResults::default()),
        }
    }
}
