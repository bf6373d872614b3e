//! Observation sources.
//!
//! An [`ObservationSource`] yields the price observations of one pool since a
//! start time. [`SwapObservationSource`] builds them from on-chain history:
//! it lists the pool's signatures through a [`TransactionFeed`], fetches the
//! transactions concurrently under a semaphore, keeps the swaps and prices
//! each one from its token balance changes.
//!
//! Collection is best effort. Individual fetch or decode failures are logged
//! and skipped, and a failed signature listing yields an empty batch.

use async_trait::async_trait;
use candle_replay_domain::{Pool, Price, PriceObservation, Protocol};
use candle_replay_protocols::rpc::types::{ParsedTransaction, SignatureInfo};
use candle_replay_protocols::{ProtocolError, RaydiumSwapDecoder, RpcProvider, SwapDecoder};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Yields chronologically ordered price observations for a pool.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Observations of `pool` with timestamp at or after `start_time`.
    ///
    /// Never fails; an unreachable source yields an empty list.
    async fn get_observations(&self, pool: &Pool, start_time: i64) -> Vec<PriceObservation>;
}

/// Signature listing and transaction lookup for an account's history.
#[async_trait]
pub trait TransactionFeed: Send + Sync {
    /// Successful signatures of `address` since `start_time`, oldest first,
    /// at most `max` of them.
    async fn signatures_since(
        &self,
        address: &str,
        start_time: i64,
        max: usize,
    ) -> Result<Vec<SignatureInfo>, ProtocolError>;

    /// The parsed transaction for `signature`, if the node knows it.
    async fn transaction(&self, signature: &str)
    -> Result<Option<ParsedTransaction>, ProtocolError>;
}

#[async_trait]
impl TransactionFeed for RpcProvider {
    async fn signatures_since(
        &self,
        address: &str,
        start_time: i64,
        max: usize,
    ) -> Result<Vec<SignatureInfo>, ProtocolError> {
        RpcProvider::signatures_since(self, address, start_time, max).await
    }

    async fn transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, ProtocolError> {
        self.get_transaction(signature).await
    }
}

/// Limits for swap collection.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Upper bound on signatures examined per pool.
    pub max_transactions: usize,
    /// Transactions fetched at once.
    pub max_concurrency: usize,
    /// Log progress after this many processed transactions; 0 disables it.
    pub progress_every: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            max_transactions: 10_000,
            max_concurrency: 16,
            progress_every: 500,
        }
    }
}

/// Observation source that replays a pool's swaps from a [`TransactionFeed`].
pub struct SwapObservationSource<F> {
    feed: Arc<F>,
    config: SourceConfig,
}

impl<F: TransactionFeed + 'static> SwapObservationSource<F> {
    /// Creates a source over `feed`.
    #[must_use]
    pub fn new(feed: Arc<F>, config: SourceConfig) -> Self {
        Self { feed, config }
    }

    fn decoder_for(pool: &Pool) -> Arc<dyn SwapDecoder> {
        match pool.protocol {
            Protocol::Raydium => Arc::new(RaydiumSwapDecoder::new(pool)),
        }
    }
}

#[async_trait]
impl<F: TransactionFeed + 'static> ObservationSource for SwapObservationSource<F> {
    async fn get_observations(&self, pool: &Pool, start_time: i64) -> Vec<PriceObservation> {
        let signatures = match self
            .feed
            .signatures_since(&pool.address, start_time, self.config.max_transactions)
            .await
        {
            Ok(signatures) => signatures,
            Err(e) => {
                warn!(pool = %pool.address, error = %e, "Failed to list pool signatures");
                return Vec::new();
            }
        };
        let total = signatures.len();
        info!(pool = %pool.address, transactions = total, "Fetching transactions");

        let decoder = Self::decoder_for(pool);
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, sig) in signatures.into_iter().enumerate() {
            let feed = Arc::clone(&self.feed);
            let decoder = Arc::clone(&decoder);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                observe(feed.as_ref(), decoder.as_ref(), &sig)
                    .await
                    .map(|obs| (index, obs))
            });
        }

        let mut collected: Vec<(usize, PriceObservation)> = Vec::new();
        let mut processed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            processed += 1;
            match joined {
                Ok(Some(entry)) => collected.push(entry),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Transaction task aborted"),
            }
            if self.config.progress_every > 0 && processed % self.config.progress_every == 0 {
                info!(processed, total, swaps = collected.len(), "Progress");
            }
        }

        collected.retain(|(_, obs)| obs.timestamp >= start_time);
        collected.sort_by_key(|(index, obs)| (obs.timestamp, *index));
        info!(
            pool = %pool.address,
            transactions = total,
            observations = collected.len(),
            "Collected price observations"
        );
        collected.into_iter().map(|(_, obs)| obs).collect()
    }
}

/// Turns one signature into an observation if it is a priced swap.
async fn observe<F: TransactionFeed + ?Sized>(
    feed: &F,
    decoder: &dyn SwapDecoder,
    sig: &SignatureInfo,
) -> Option<PriceObservation> {
    let tx = match feed.transaction(&sig.signature).await {
        Ok(Some(tx)) => tx,
        Ok(None) => {
            debug!(signature = %sig.signature, "Transaction not found");
            return None;
        }
        Err(e) => {
            warn!(signature = %sig.signature, error = %e, "Failed to fetch transaction");
            return None;
        }
    };
    if !decoder.is_swap(&tx) {
        return None;
    }

    let timestamp = tx.block_time.or(sig.block_time)?;
    let fill = match decoder.extract_fill(&tx) {
        Ok(Some(fill)) => fill,
        Ok(None) => {
            debug!(signature = %sig.signature, "Swap moved no base tokens");
            return None;
        }
        Err(e) => {
            debug!(signature = %sig.signature, error = %e, "Failed to price swap");
            return None;
        }
    };
    match Price::new(fill.price) {
        Ok(price) => Some(PriceObservation::new(timestamp, price).with_quote_amount(fill.quote_amount)),
        Err(e) => {
            debug!(signature = %sig.signature, error = %e, "Discarding unusable price");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_replay_protocols::raydium::{AMM_V4_AUTHORITY, AMM_V4_PROGRAM_ID};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    const POOL: &str = "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2";
    const BASE: &str = "3GFFpfN7w9ZRPCFHKDH73NTLSV9jKyJF7HdYcjDzpump";
    const QUOTE: &str = "So11111111111111111111111111111111111111112";
    // base58 of the single byte 9, the `SwapBaseIn` tag.
    const SWAP_DATA: &str = "A";

    #[derive(Default)]
    struct MemoryFeed {
        signatures: Vec<SignatureInfo>,
        transactions: HashMap<String, ParsedTransaction>,
        fail_listing: bool,
    }

    impl MemoryFeed {
        fn push(&mut self, signature: &str, block_time: i64, tx: Option<ParsedTransaction>) {
            self.signatures.push(SignatureInfo {
                signature: signature.to_string(),
                slot: 1,
                block_time: Some(block_time),
                err: None,
            });
            if let Some(tx) = tx {
                self.transactions.insert(signature.to_string(), tx);
            }
        }
    }

    #[async_trait]
    impl TransactionFeed for MemoryFeed {
        async fn signatures_since(
            &self,
            _address: &str,
            _start_time: i64,
            max: usize,
        ) -> Result<Vec<SignatureInfo>, ProtocolError> {
            if self.fail_listing {
                return Err(ProtocolError::Status(503));
            }
            Ok(self.signatures.iter().take(max).cloned().collect())
        }

        async fn transaction(
            &self,
            signature: &str,
        ) -> Result<Option<ParsedTransaction>, ProtocolError> {
            if signature == "broken" {
                return Err(ProtocolError::MissingField("result"));
            }
            Ok(self.transactions.get(signature).cloned())
        }
    }

    fn pool() -> Pool {
        Pool::new(POOL, Protocol::Raydium, BASE, QUOTE)
    }

    fn balance(index: u32, mint: &str, amount: &str) -> Value {
        json!({
            "accountIndex": index,
            "mint": mint,
            "owner": AMM_V4_AUTHORITY,
            "uiTokenAmount": {"amount": "0", "decimals": 6, "uiAmountString": amount}
        })
    }

    /// A swap moving 10 base out of the vault against `quote_in` quote.
    fn swap(block_time: i64, quote_in: u32) -> ParsedTransaction {
        transaction(block_time, SWAP_DATA, quote_in)
    }

    fn transaction(block_time: i64, data: &str, quote_in: u32) -> ParsedTransaction {
        serde_json::from_value(json!({
            "slot": 1,
            "blockTime": block_time,
            "meta": {
                "err": null,
                "preTokenBalances": [balance(1, BASE, "100"), balance(2, QUOTE, "50")],
                "postTokenBalances": [balance(1, BASE, "90"), balance(2, QUOTE, &(50 + quote_in).to_string())]
            },
            "transaction": {
                "signatures": ["sig"],
                "message": {"instructions": [
                    {"programId": AMM_V4_PROGRAM_ID, "accounts": [POOL], "data": data}
                ]}
            }
        }))
        .unwrap()
    }

    fn source(feed: MemoryFeed) -> SwapObservationSource<MemoryFeed> {
        SwapObservationSource::new(
            Arc::new(feed),
            SourceConfig {
                max_concurrency: 2,
                ..SourceConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_swaps_become_ordered_observations() {
        let mut feed = MemoryFeed::default();
        feed.push("s1", 170, Some(swap(170, 30)));
        feed.push("s2", 100, Some(swap(100, 10)));
        feed.push("s3", 110, Some(swap(110, 20)));

        let observations = source(feed).get_observations(&pool(), 0).await;

        let stamps: Vec<i64> = observations.iter().map(|o| o.timestamp).collect();
        assert_eq!(stamps, vec![100, 110, 170]);
        let prices: Vec<f64> = observations.iter().map(|o| o.price.value()).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
        assert_eq!(observations[0].quote_amount, Some(10.0));
    }

    #[tokio::test]
    async fn test_same_second_swaps_keep_feed_order() {
        let mut feed = MemoryFeed::default();
        feed.push("a", 100, Some(swap(100, 10)));
        feed.push("b", 100, Some(swap(100, 40)));

        let observations = source(feed).get_observations(&pool(), 0).await;
        let prices: Vec<f64> = observations.iter().map(|o| o.price.value()).collect();
        assert_eq!(prices, vec![1.0, 4.0]);
    }

    #[tokio::test]
    async fn test_skips_non_swaps_and_failures() {
        let mut feed = MemoryFeed::default();
        feed.push("swap", 100, Some(swap(100, 10)));
        // Tag 3 is not a swap instruction; base58 of byte 3 is "4".
        feed.push("deposit", 105, Some(transaction(105, "4", 10)));
        feed.push("missing", 110, None);
        feed.push("broken", 120, None);

        let observations = source(feed).get_observations(&pool(), 0).await;
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].timestamp, 100);
    }

    #[tokio::test]
    async fn test_drops_observations_before_start() {
        let mut feed = MemoryFeed::default();
        feed.push("old", 50, Some(swap(50, 10)));
        feed.push("new", 150, Some(swap(150, 10)));

        let observations = source(feed).get_observations(&pool(), 100).await;
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].timestamp, 150);
    }

    #[tokio::test]
    async fn test_listing_failure_yields_empty_batch() {
        let feed = MemoryFeed {
            fail_listing: true,
            ..MemoryFeed::default()
        };
        assert!(source(feed).get_observations(&pool(), 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_respects_transaction_cap() {
        let mut feed = MemoryFeed::default();
        for i in 0..5 {
            feed.push(&format!("s{i}"), 100 + i, Some(swap(100 + i, 10)));
        }
        let source = SwapObservationSource::new(
            Arc::new(feed),
            SourceConfig {
                max_transactions: 3,
                ..SourceConfig::default()
            },
        );
        assert_eq!(source.get_observations(&pool(), 0).await.len(), 3);
    }
}
