/// Number of satoshis in one bitcoin.
pub const SATOSHIS_PER_BTC: i64 = 100_000_000;

/// Converts an amount of satoshis into fractional BTC, keeping its sign.
pub fn satoshis_to_btc(satoshis: i64) -> f64 {
    satoshis as f64 / SATOSHIS_PER_BTC as f64
}
