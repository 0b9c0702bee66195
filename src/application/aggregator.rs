use super::prices::PriceFetcher;
use super::Aggregator;
use crate::domain::{
    classifier::classify_transaction,
    errors::AggregatorError,
    models::{AddressSummary, EnrichedTransaction, PriceCache},
    units::satoshis_to_btc,
};
use crate::infrastructure::bc_client::BcClient;
use futures::future::join_all;
use typed_builder::TypedBuilder;

#[derive(Clone, TypedBuilder)]
pub struct AddressAggregator<C, P> {
    bc_client: C,
    prices: PriceFetcher<C, P>,
}

#[async_trait::async_trait]
impl<C, P> Aggregator for AddressAggregator<C, P>
where
    C: BcClient + Send + Sync + 'static,
    P: PriceCache + Send + Sync + 'static,
{
    async fn address_summary(&self, address: &str) -> Result<AddressSummary, AggregatorError> {
        tracing::info!("Building summary for address {}", address);
        let (raw_transactions, stats) = tokio::try_join!(
            self.bc_client.address_transactions(address),
            self.bc_client.address_stats(address)
        )?;

        let latest_price = self.prices.latest_price().await;

        // Mempool entries have no block time to price against yet.
        let confirmed: Vec<_> = raw_transactions
            .iter()
            .filter_map(|tx| match tx.block_time() {
                Ok(block_time) => Some((tx, block_time)),
                Err(e) => {
                    tracing::warn!("Skipping transaction in summary of {}: {}", address, e);
                    None
                }
            })
            .collect();

        // join_all yields results in input order, so prices[i] belongs to confirmed[i]
        let prices = join_all(
            confirmed
                .iter()
                .map(|(_, block_time)| self.prices.historical_price(*block_time)),
        )
        .await;

        let transactions = confirmed
            .iter()
            .zip(prices)
            .map(|((tx, _), price)| classify_transaction(tx, address, price))
            .collect::<Result<Vec<_>, _>>()?;

        let current_balance = satoshis_to_btc(stats.chain_stats.balance_satoshis());
        tracing::info!(
            "Address {} holds {} BTC across {} transactions",
            address,
            current_balance,
            transactions.len()
        );

        Ok(AddressSummary {
            address: address.to_string(),
            btc_latest_price: latest_price,
            current_balance,
            current_price_balance: current_balance * latest_price.value_or_zero(),
            transactions,
        })
    }

    async fn transaction_detail(
        &self,
        address: &str,
        txid: &str,
    ) -> Result<EnrichedTransaction, AggregatorError> {
        tracing::info!("Getting transaction {} for address {}", txid, address);
        let tx = self.bc_client.transaction(txid).await?;
        let price = self.prices.historical_price(tx.block_time()?).await;
        classify_transaction(&tx, address, price)
    }
}
