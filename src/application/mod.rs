use crate::domain::errors::AggregatorError;
use crate::domain::models::{AddressSummary, EnrichedTransaction};

pub mod aggregator;
pub mod app;
pub mod prices;

/// The `Aggregator` trait gathers explorer data for an address and enriches
/// every transaction with the USD price at the time it was confirmed.
///
/// # Errors
///
/// Failures to fetch transactions or balances abort the operation with an
/// `AggregatorError`. Price lookups never fail: an unreachable price source
/// yields zero valued USD amounts instead.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Aggregator {
    /// Balance, valuation and enriched history of `address`.
    async fn address_summary(&self, address: &str) -> Result<AddressSummary, AggregatorError>;

    /// A single transaction of `address`, enriched the same way as in the summary.
    async fn transaction_detail(
        &self,
        address: &str,
        txid: &str,
    ) -> Result<EnrichedTransaction, AggregatorError>;
}
