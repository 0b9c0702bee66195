use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::errors::AggregatorError;

/// A transaction as reported by the explorer (`/api/tx/:txid`).
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RawTransaction {
    /// Transaction id
    pub txid: String,
    /// Inputs spending previous outputs
    #[serde(default)]
    pub vin: Vec<TxInput>,
    /// Outputs created by this transaction
    #[serde(default)]
    pub vout: Vec<TxOutput>,
    /// Fee paid, in satoshis
    pub fee: u64,
    /// Confirmation status
    pub status: TxStatus,
}

impl RawTransaction {
    /// Block time of the transaction, failing for transactions still in the mempool.
    pub fn block_time(&self) -> Result<i64, AggregatorError> {
        self.status
            .block_time
            .ok_or_else(|| AggregatorError::UnconfirmedTransaction(self.txid.clone()))
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TxInput {
    /// Output being spent. Absent for coinbase inputs.
    #[serde(default)]
    pub prevout: Option<TxOutput>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TxOutput {
    /// Destination address, absent for non-standard scripts
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    /// Amount in satoshis
    pub value: u64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct TxStatus {
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<u64>,
    /// Unix timestamp of the including block
    #[serde(default)]
    pub block_time: Option<i64>,
}

/// Address record as reported by the explorer (`/api/address/:address`).
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AddressStats {
    pub chain_stats: ChainStats,
}

/// Cumulative confirmed totals of an address, in satoshis.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct ChainStats {
    pub funded_txo_sum: u64,
    pub spent_txo_sum: u64,
}

impl ChainStats {
    pub fn balance_satoshis(&self) -> i64 {
        self.funded_txo_sum as i64 - self.spent_txo_sum as i64
    }
}

/// USD price of one bitcoin, or the fact that it could not be obtained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Price {
    Available(f64),
    Unavailable,
}

impl Price {
    /// Numeric value used in computations; an unavailable price counts as zero.
    pub fn value_or_zero(self) -> f64 {
        match self {
            Price::Available(value) => value,
            Price::Unavailable => 0.0,
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value_or_zero())
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sent,
    Received,
}

/// A transaction seen from one address, with amounts rendered for display.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransaction {
    pub txid: String,
    /// Block time as `DD/MM/YYYY HH:mm` (UTC-4)
    pub date: String,
    pub transaction_type: TransactionType,
    /// Net BTC moved, always positive
    pub transaction_amount: String,
    /// Fee in BTC
    pub fee: String,
    pub btc_price_on_date: String,
    pub fee_in_usd: String,
    pub transaction_amount_in_usd: String,
}

/// Balance, valuation and history of an address.
#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSummary {
    pub address: String,
    pub btc_latest_price: Price,
    pub current_balance: f64,
    pub current_price_balance: f64,
    pub transactions: Vec<EnrichedTransaction>,
}

/// Query accepted by the search page. Empty values count as absent.
#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
pub struct SearchQuery {
    pub address: Option<String>,
    pub txid: Option<String>,
}

impl SearchQuery {
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().filter(|v| !v.is_empty())
    }

    pub fn txid(&self) -> Option<&str> {
        self.txid.as_deref().filter(|v| !v.is_empty())
    }
}

/// Data displayed by the search page.
#[derive(Clone, Serialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub address: Option<String>,
    pub transactions: Vec<EnrichedTransaction>,
    pub current_balance: f64,
    pub current_price_balance: f64,
}

/// Store of historical prices keyed by block time.
pub trait PriceCache {
    /// Cached price for `timestamp` if present and not expired.
    fn get(&self, timestamp: i64) -> Option<f64>;

    /// Stores `price`, restarting the retention window of the key.
    fn set(&self, timestamp: i64, price: f64);

    /// Drops expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}
