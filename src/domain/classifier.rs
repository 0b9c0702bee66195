use super::errors::AggregatorError;
use super::format::{format_block_time, format_btc, format_fiat_price, format_usd};
use super::models::{EnrichedTransaction, Price, RawTransaction, TransactionType};
use super::units::satoshis_to_btc;

/// Satoshis spent by `address` in `tx`, taken from the previous outputs it owned.
pub fn total_input(tx: &RawTransaction, address: &str) -> i64 {
    tx.vin
        .iter()
        .filter_map(|input| input.prevout.as_ref())
        .filter(|prevout| prevout.scriptpubkey_address.as_deref() == Some(address))
        .map(|prevout| prevout.value as i64)
        .sum()
}

/// Satoshis received by `address` in the outputs of `tx`.
pub fn total_output(tx: &RawTransaction, address: &str) -> i64 {
    tx.vout
        .iter()
        .filter(|output| output.scriptpubkey_address.as_deref() == Some(address))
        .map(|output| output.value as i64)
        .sum()
}

/// Computes how `tx` moved funds for `address` and renders the amounts, valued
/// at `price`.
///
/// A transaction is `Sent` only when the address lost funds; a zero net
/// movement is reported as `Received`.
pub fn classify_transaction(
    tx: &RawTransaction,
    address: &str,
    price: Price,
) -> Result<EnrichedTransaction, AggregatorError> {
    let block_time = tx.block_time()?;
    let date = format_block_time(block_time).ok_or(AggregatorError::InvalidBlockTime(block_time))?;

    let net_moved = total_input(tx, address) - total_output(tx, address);
    let transaction_type = if net_moved > 0 {
        TransactionType::Sent
    } else {
        TransactionType::Received
    };

    let btc_amount = satoshis_to_btc(net_moved.abs());
    let fee_btc = satoshis_to_btc(tx.fee as i64);
    let usd_per_btc = price.value_or_zero();

    Ok(EnrichedTransaction {
        txid: tx.txid.clone(),
        date,
        transaction_type,
        transaction_amount: format_btc(btc_amount),
        fee: format_btc(fee_btc),
        btc_price_on_date: format_fiat_price(usd_per_btc),
        fee_in_usd: format_usd(fee_btc * usd_per_btc),
        transaction_amount_in_usd: format_usd(btc_amount * usd_per_btc),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::models::{TxInput, TxOutput, TxStatus};

    pub const ADDRESS: &str = "bc1qexampleaddress";
    pub const OTHER: &str = "bc1qcounterparty";

    pub fn output(address: &str, value: u64) -> TxOutput {
        TxOutput {
            scriptpubkey_address: Some(address.to_string()),
            value,
        }
    }

    pub fn raw_tx(
        txid: &str,
        inputs: Vec<Option<TxOutput>>,
        outputs: Vec<TxOutput>,
        fee: u64,
        block_time: Option<i64>,
    ) -> RawTransaction {
        RawTransaction {
            txid: txid.to_string(),
            vin: inputs
                .into_iter()
                .map(|prevout| TxInput { prevout })
                .collect(),
            vout: outputs,
            fee,
            status: TxStatus {
                confirmed: block_time.is_some(),
                block_height: block_time.map(|_| 800_000),
                block_time,
            },
        }
    }

    /// Spends 100,000 sats of the address and returns 40,000 as change.
    pub fn spending_tx(txid: &str) -> RawTransaction {
        raw_tx(
            txid,
            vec![Some(output(ADDRESS, 60_000)), Some(output(ADDRESS, 40_000))],
            vec![output(OTHER, 59_500), output(ADDRESS, 40_000)],
            500,
            Some(1_700_000_000),
        )
    }

    #[test]
    fn spending_transaction_is_sent() {
        let tx = spending_tx("a1");
        let enriched = classify_transaction(&tx, ADDRESS, Price::Available(50_000.0)).unwrap();

        assert_eq!(
            enriched,
            EnrichedTransaction {
                txid: "a1".to_string(),
                date: "14/11/2023 18:13".to_string(),
                transaction_type: TransactionType::Sent,
                transaction_amount: "0,00060000".to_string(),
                fee: "0,00000500".to_string(),
                btc_price_on_date: "50.000,00".to_string(),
                fee_in_usd: "0,25".to_string(),
                transaction_amount_in_usd: "30,00".to_string(),
            }
        );
    }

    #[test]
    fn incoming_funds_are_received() {
        let tx = raw_tx(
            "b2",
            vec![Some(output(OTHER, 250_000))],
            vec![output(ADDRESS, 200_000), output(OTHER, 49_000)],
            1_000,
            Some(1_700_000_000),
        );
        let enriched = classify_transaction(&tx, ADDRESS, Price::Available(40_000.0)).unwrap();

        assert_eq!(enriched.transaction_type, TransactionType::Received);
        assert_eq!(enriched.transaction_amount, "0,00200000");
        assert_eq!(enriched.transaction_amount_in_usd, "80,00");
        assert_eq!(enriched.fee_in_usd, "0,40");
    }

    #[test]
    fn zero_net_movement_is_received() {
        let tx = raw_tx(
            "c3",
            vec![Some(output(ADDRESS, 70_000))],
            vec![output(ADDRESS, 70_000)],
            0,
            Some(1_700_000_000),
        );
        let enriched = classify_transaction(&tx, ADDRESS, Price::Available(50_000.0)).unwrap();

        assert_eq!(enriched.transaction_type, TransactionType::Received);
        assert_eq!(enriched.transaction_amount, "0,00000000");
    }

    #[test]
    fn inputs_without_prevout_are_skipped() {
        let tx = raw_tx(
            "d4",
            vec![None, Some(output(ADDRESS, 10_000))],
            vec![output(ADDRESS, 625_000_000)],
            0,
            Some(1_700_000_000),
        );

        assert_eq!(total_input(&tx, ADDRESS), 10_000);
        assert_eq!(total_output(&tx, ADDRESS), 625_000_000);
        let enriched = classify_transaction(&tx, ADDRESS, Price::Unavailable).unwrap();
        assert_eq!(enriched.transaction_amount, "6,24990000");
    }

    #[test]
    fn unavailable_price_yields_zero_usd() {
        let enriched = classify_transaction(&spending_tx("e5"), ADDRESS, Price::Unavailable).unwrap();

        assert_eq!(enriched.fee_in_usd, "0,00");
        assert_eq!(enriched.transaction_amount_in_usd, "0,00");
        assert_eq!(enriched.btc_price_on_date, "0,00");
        assert_eq!(enriched.transaction_amount, "0,00060000");
    }

    #[test]
    fn unconfirmed_transaction_is_rejected() {
        let mut tx = spending_tx("f6");
        tx.status = TxStatus::default();

        let err = classify_transaction(&tx, ADDRESS, Price::Available(1.0)).unwrap_err();
        assert!(matches!(err, AggregatorError::UnconfirmedTransaction(txid) if txid == "f6"));
    }

    #[test]
    fn enriched_transaction_serializes_with_camel_case_keys() {
        let enriched = classify_transaction(&spending_tx("a1"), ADDRESS, Price::Available(50_000.0)).unwrap();
        let json = serde_json::to_value(&enriched).unwrap();

        assert_eq!(json["transactionType"], "sent");
        assert_eq!(json["transactionAmountInUsd"], "30,00");
        assert_eq!(json["btcPriceOnDate"], "50.000,00");
    }
}
