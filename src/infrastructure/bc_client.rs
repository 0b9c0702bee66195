use crate::domain::errors::BcClientError;
use crate::domain::models::{AddressStats, RawTransaction};

/// A trait representing a client of a Bitcoin block explorer exposing the
/// Esplora REST API together with mempool.space price endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BcClient {
    /// Retrieves the transaction history of an address, most recent first.
    ///
    /// # Arguments
    ///
    /// * `address` - The Bitcoin address to look up.
    async fn address_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<RawTransaction>, BcClientError>;

    /// Retrieves the funded/spent totals of an address.
    ///
    /// # Arguments
    ///
    /// * `address` - The Bitcoin address to look up.
    async fn address_stats(&self, address: &str) -> Result<AddressStats, BcClientError>;

    /// Retrieves a single transaction by id.
    ///
    /// # Arguments
    ///
    /// * `txid` - The transaction id, hex encoded.
    async fn transaction(&self, txid: &str) -> Result<RawTransaction, BcClientError>;

    /// Retrieves the current USD price of one bitcoin.
    async fn latest_price(&self) -> Result<f64, BcClientError>;

    /// Retrieves the USD price of one bitcoin at the given unix timestamp.
    ///
    /// # Arguments
    ///
    /// * `timestamp` - Unix timestamp in seconds.
    async fn historical_price(&self, timestamp: i64) -> Result<f64, BcClientError>;
}
