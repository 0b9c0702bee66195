//! Rendering of amounts and dates using the Brazilian Portuguese conventions
//! shown to end users: `.` groups thousands and `,` separates decimals.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Offset west of UTC used for every displayed date (America/Cuiaba, no DST).
pub const DISPLAY_UTC_OFFSET_SECS: i32 = 4 * 3600;

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// BTC amount with exactly eight fraction digits, e.g. `1.234,50000000`.
pub fn format_btc(value: f64) -> String {
    format_grouped(value, 8, 8)
}

/// Fiat price with two or three fraction digits, e.g. `50.000,00`.
pub fn format_fiat_price(value: f64) -> String {
    format_grouped(value, 2, 3)
}

/// USD amount with exactly two fraction digits and no thousands grouping,
/// e.g. `1234,50`.
pub fn format_usd(value: f64) -> String {
    to_fixed(value, 2).replace('.', ",")
}

/// Formats a block time (unix seconds) as `DD/MM/YYYY HH:mm` in the display
/// timezone. `None` when the timestamp cannot be represented.
pub fn format_block_time(unix_seconds: i64) -> Option<String> {
    let offset = FixedOffset::west_opt(DISPLAY_UTC_OFFSET_SECS)?;
    let date = DateTime::<Utc>::from_timestamp(unix_seconds, 0)?;
    Some(date.with_timezone(&offset).format(DATE_FORMAT).to_string())
}

/// Renders `value` with exactly `digits` fraction digits. A midpoint of the
/// exact binary value rounds away from zero, so `0.125` becomes `0.13`.
fn to_fixed(value: f64, digits: u32) -> String {
    match Decimal::from_f64_retain(value) {
        Some(exact) => {
            let mut rounded =
                exact.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(digits);
            if rounded.is_zero() {
                rounded.set_sign_positive(true);
            }
            rounded.to_string()
        }
        // NaN, infinities and magnitudes beyond 96 bits
        None => format!("{:.*}", digits as usize, value),
    }
}

fn format_grouped(value: f64, min_fraction: usize, max_fraction: usize) -> String {
    let fixed = to_fixed(value.abs(), max_fraction as u32);
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut fraction_len = fraction.len();
    while fraction_len > min_fraction && fraction.as_bytes()[fraction_len - 1] == b'0' {
        fraction_len -= 1;
    }
    let fraction = &fraction[..fraction_len];

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, digit) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let is_negative = value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let sign = if is_negative { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn btc_amounts_have_eight_fraction_digits() {
        assert_eq!(format_btc(0.0006), "0,00060000");
        assert_eq!(format_btc(0.000005), "0,00000500");
        assert_eq!(format_btc(0.0), "0,00000000");
        assert_eq!(format_btc(1234.5), "1.234,50000000");
        assert_eq!(format_btc(21_000_000.0), "21.000.000,00000000");
    }

    #[test]
    fn fiat_prices_keep_up_to_three_fraction_digits() {
        assert_eq!(format_fiat_price(50_000.0), "50.000,00");
        assert_eq!(format_fiat_price(50_000.125), "50.000,125");
        assert_eq!(format_fiat_price(42_123.5), "42.123,50");
        assert_eq!(format_fiat_price(999.0), "999,00");
        assert_eq!(format_fiat_price(0.0), "0,00");
    }

    #[test]
    fn negative_values_keep_their_sign() {
        assert_eq!(format_fiat_price(-1500.0), "-1.500,00");
        assert_eq!(format_btc(-0.0), "0,00000000");
    }

    #[test]
    fn usd_amounts_use_a_comma_without_grouping() {
        assert_eq!(format_usd(30.000000000000004), "30,00");
        assert_eq!(format_usd(0.25), "0,25");
        assert_eq!(format_usd(1234.5), "1234,50");
        assert_eq!(format_usd(0.0), "0,00");
    }

    #[test]
    fn usd_midpoints_round_up() {
        use crate::domain::units::satoshis_to_btc;

        assert_eq!(format_usd(satoshis_to_btc(250) * 50_000.0), "0,13");
        assert_eq!(format_usd(0.375), "0,38");
        assert_eq!(format_usd(-0.125), "-0,13");
        assert_eq!(format_usd(-0.001), "0,00");
        // 1.005 is stored as 1.00499999..., so it is not a midpoint
        assert_eq!(format_usd(1.005), "1,00");
    }

    #[test]
    fn fiat_price_midpoints_round_up() {
        assert_eq!(format_fiat_price(50_000.0625), "50.000,063");
        assert_eq!(format_fiat_price(1_234.5625), "1.234,563");
    }

    #[test]
    fn block_time_is_rendered_at_utc_minus_four() {
        // 2023-11-14 22:13:20 UTC
        assert_eq!(
            format_block_time(1_700_000_000).as_deref(),
            Some("14/11/2023 18:13")
        );
        // 2024-01-01 02:30:00 UTC falls on the previous day locally
        assert_eq!(
            format_block_time(1_704_076_200).as_deref(),
            Some("31/12/2023 22:30")
        );
    }

    #[test]
    fn out_of_range_block_time_is_rejected() {
        assert_eq!(format_block_time(i64::MAX), None);
    }
}
