use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};

use crate::domain::errors::BcClientError;
use crate::domain::models::{AddressStats, RawTransaction};

use super::bc_client::BcClient;

pub const DEFAULT_EXPLORER_URL: &str = "https://mempool.space";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Addresses (base58 or bech32) and txids (hex) are plain ASCII alphanumerics.
/// Anything else is rejected before it can reach a URL path, where `/`, `?`,
/// `#` or `..` would change the endpoint being called.
fn path_segment<'a>(kind: &'static str, value: &'a str) -> Result<&'a str, BcClientError> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(value)
    } else {
        Err(BcClientError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct UsdQuote {
    #[serde(rename = "USD")]
    usd: f64,
}

#[derive(Deserialize)]
struct HistoricalPrices {
    prices: Vec<UsdQuote>,
}

/// A client for the mempool.space explorer API.
#[derive(Clone)]
pub struct MempoolClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    num_retries: usize,
    backoff_millis: u64,
}

impl MempoolClient {
    /// Creates a new `MempoolClient` for the explorer at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the explorer, e.g. `https://mempool.space`.
    /// * `num_retries` - How many times a retryable failure is repeated.
    /// * `backoff_millis` - Scale of the exponential delay between retries.
    pub fn new(
        base_url: &str,
        num_retries: usize,
        backoff_millis: u64,
    ) -> Result<Self, BcClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BcClientError::FailedToBuildClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            num_retries,
            backoff_millis,
        })
    }

    // Delays grow as 2, 4, 8 ... times `backoff_millis`.
    fn retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(self.backoff_millis)
            .map(jitter)
            .take(self.num_retries)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BcClientError> {
        let url = format!("{}{}", self.base_url, path);
        RetryIf::spawn(
            self.retry_strategy(),
            || self.fetch::<T>(&url),
            |e: &BcClientError| {
                let retryable = e.is_retryable();
                if retryable {
                    tracing::warn!("Explorer request failed, retrying: {}", e);
                }
                retryable
            },
        )
        .await
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, BcClientError> {
        let network_error = |e: reqwest::Error| BcClientError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.http.get(url).send().await.map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(BcClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(network_error)?;
        serde_json::from_slice(&body).map_err(|e| BcClientError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl BcClient for MempoolClient {
    async fn address_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<RawTransaction>, BcClientError> {
        let address = path_segment("address", address)?;
        self.get_json(&format!("/api/address/{address}/txs")).await
    }

    async fn address_stats(&self, address: &str) -> Result<AddressStats, BcClientError> {
        let address = path_segment("address", address)?;
        self.get_json(&format!("/api/address/{address}")).await
    }

    async fn transaction(&self, txid: &str) -> Result<RawTransaction, BcClientError> {
        let txid = path_segment("txid", txid)?;
        self.get_json(&format!("/api/tx/{txid}")).await
    }

    async fn latest_price(&self) -> Result<f64, BcClientError> {
        let quote: UsdQuote = self.get_json("/api/v1/prices").await?;
        Ok(quote.usd)
    }

    async fn historical_price(&self, timestamp: i64) -> Result<f64, BcClientError> {
        let path = format!("/api/v1/historical-price?currency=USD&timestamp={timestamp}");
        let history: HistoricalPrices = self.get_json(&path).await?;
        history
            .prices
            .first()
            .map(|quote| quote.usd)
            .ok_or_else(|| BcClientError::MalformedResponse {
                url: format!("{}{}", self.base_url, path),
                reason: "empty price list".to_string(),
            })
    }
}
