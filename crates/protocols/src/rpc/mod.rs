//! Solana JSON-RPC client.
//!
//! Thin wrapper over `reqwest` speaking JSON-RPC 2.0 for the three calls the
//! pipeline needs: signature pagination, transaction fetch and the activity
//! checks built on top of them. Transient failures are retried with an
//! exponential back-off before surfacing as [`ProtocolError`].

pub mod types;

use crate::error::ProtocolError;
use crate::parse_address;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use types::{ParsedTransaction, RpcRequest, RpcResponse, SignatureInfo};

/// Largest page `getSignaturesForAddress` accepts.
pub const SIGNATURE_PAGE_LIMIT: usize = 1000;

/// Configuration for the RPC client.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// HTTP(S) endpoint.
    pub url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries for transient failures.
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds; doubled on each attempt.
    pub retry_delay_ms: u64,
    /// Commitment level.
    pub commitment: String,
    /// Upper bound on pages walked when searching for the oldest signature.
    pub max_history_pages: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://api.mainnet-beta.solana.com".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 500,
            commitment: "confirmed".to_string(),
            max_history_pages: 50,
        }
    }
}

/// JSON-RPC provider.
pub struct RpcProvider {
    client: reqwest::Client,
    config: RpcConfig,
    next_id: AtomicU64,
}

impl RpcProvider {
    /// Creates a provider from a configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: RpcConfig) -> Result<Self, ProtocolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Performs a JSON-RPC call, retrying transient failures.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted, or immediately for
    /// non-transient failures.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, ProtocolError> {
        let mut attempt = 0;
        loop {
            match self.call_once(method, &params).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self
                        .config
                        .retry_delay_ms
                        .saturating_mul(2u64.saturating_pow(attempt - 1));
                    warn!(
                        method,
                        attempt,
                        delay_ms = delay,
                        error = %e,
                        "Transient RPC failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &Value,
    ) -> Result<Option<T>, ProtocolError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: params.clone(),
        };

        let response = self.client.post(&self.config.url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProtocolError::Status(status.as_u16()));
        }

        let body: RpcResponse<T> = serde_json::from_slice(&response.bytes().await?)?;
        if let Some(err) = body.error {
            return Err(ProtocolError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(body.result)
    }

    /// Fetches one page of signatures for an address, newest first.
    ///
    /// # Arguments
    /// * `address` - Account to query
    /// * `before` - Start searching backwards from this signature
    /// * `limit` - Page size, capped at [`SIGNATURE_PAGE_LIMIT`]
    ///
    /// # Errors
    /// Returns an error if the address is invalid or the call fails.
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ProtocolError> {
        parse_address(address)?;
        let mut options = json!({
            "limit": limit.clamp(1, SIGNATURE_PAGE_LIMIT),
            "commitment": self.config.commitment,
        });
        if let Some(before) = before {
            options["before"] = json!(before);
        }
        Ok(self
            .call("getSignaturesForAddress", json!([address, options]))
            .await?
            .unwrap_or_default())
    }

    /// Collects successful signatures for `address` with `blockTime >= start_time`.
    ///
    /// See [`collect_signatures`] for the paging rules.
    ///
    /// # Returns
    /// Signatures in chronological order (oldest first).
    ///
    /// # Errors
    /// Returns an error only if the first page cannot be fetched.
    pub async fn signatures_since(
        &self,
        address: &str,
        start_time: i64,
        max: usize,
    ) -> Result<Vec<SignatureInfo>, ProtocolError> {
        let signatures = collect_signatures(
            move |before| async move {
                self.get_signatures_for_address(address, before.as_deref(), SIGNATURE_PAGE_LIMIT)
                    .await
            },
            SIGNATURE_PAGE_LIMIT,
            start_time,
            max,
        )
        .await?;
        info!(address, signatures = signatures.len(), "Collected signatures");
        Ok(signatures)
    }

    /// Fetches a transaction with `jsonParsed` encoding.
    ///
    /// # Returns
    /// `None` when the node does not know the signature.
    ///
    /// # Errors
    /// Returns an error if the call fails or the payload cannot be decoded.
    pub async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, ProtocolError> {
        self.call(
            "getTransaction",
            json!([
                signature,
                {
                    "encoding": "jsonParsed",
                    "maxSupportedTransactionVersion": 0,
                    "commitment": self.config.commitment,
                }
            ]),
        )
        .await
    }

    /// Finds the block time of the oldest transaction touching `mint`.
    ///
    /// See [`oldest_block_time`]; at most `max_history_pages` pages are read.
    ///
    /// # Errors
    /// Returns an error if the first page cannot be fetched.
    pub async fn token_creation_time(&self, mint: &str) -> Result<Option<i64>, ProtocolError> {
        let oldest = oldest_block_time(
            move |before| async move {
                self.get_signatures_for_address(mint, before.as_deref(), SIGNATURE_PAGE_LIMIT)
                    .await
            },
            SIGNATURE_PAGE_LIMIT,
            self.config.max_history_pages,
        )
        .await?;
        debug!(mint, created = ?oldest, "Creation time search finished");
        Ok(oldest)
    }

    /// Whether `pool` has at least one transaction newer than `threshold_days` ago.
    ///
    /// # Errors
    /// Returns an error if the signature query fails.
    pub async fn is_pool_active(
        &self,
        pool: &str,
        threshold_days: u32,
    ) -> Result<bool, ProtocolError> {
        let threshold = chrono::Utc::now().timestamp() - i64::from(threshold_days) * 86_400;
        let newest = self.get_signatures_for_address(pool, None, 1).await?;
        Ok(newest
            .first()
            .and_then(|sig| sig.block_time)
            .is_some_and(|t| t >= threshold))
    }
}

/// Walks signature pages backwards and keeps successful signatures with
/// `blockTime >= start_time`.
///
/// `fetch` receives the `before` cursor (`None` for the newest page) and
/// returns up to `page_limit` signatures, newest first. Paging stops when a
/// page is short, when a page reaches past `start_time`, or once `max`
/// signatures were gathered. When more than `max` were gathered the newest
/// `max` are kept.
///
/// # Returns
/// Signatures in chronological order (oldest first).
///
/// # Errors
/// Returns the error of the first page; later page failures are logged and
/// end pagination with what was collected.
pub async fn collect_signatures<P, Fut>(
    mut fetch: P,
    page_limit: usize,
    start_time: i64,
    max: usize,
) -> Result<Vec<SignatureInfo>, ProtocolError>
where
    P: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Vec<SignatureInfo>, ProtocolError>>,
{
    let mut collected: Vec<SignatureInfo> = Vec::new();
    let mut before: Option<String> = None;

    while collected.len() < max {
        let first_page = before.is_none();
        let page = match fetch(before.clone()).await {
            Ok(page) => page,
            Err(e) if first_page => return Err(e),
            Err(e) => {
                warn!(error = %e, collected = collected.len(), "Signature pagination stopped early");
                break;
            }
        };
        let page_len = page.len();
        before = page.last().map(|sig| sig.signature.clone());

        let reached_start = page
            .last()
            .and_then(|sig| sig.block_time)
            .is_some_and(|t| t < start_time);
        let fresh: Vec<SignatureInfo> = page
            .into_iter()
            .filter(|sig| sig.succeeded() && sig.block_time.is_some_and(|t| t >= start_time))
            .collect();

        debug!(
            page = page_len,
            kept = fresh.len(),
            total = collected.len() + fresh.len(),
            "Fetched signature page"
        );

        collected.extend(fresh);
        if page_len < page_limit || reached_start {
            break;
        }
    }

    collected.truncate(max);
    collected.reverse();
    Ok(collected)
}

/// Walks signature pages backwards and returns the oldest `blockTime` seen.
///
/// Stops at the first short page (the end of the history) or after
/// `max_pages` pages, in which case the result is approximate.
///
/// # Errors
/// Returns the error of the first page; later page failures are logged and
/// end the search with the oldest time found so far.
pub async fn oldest_block_time<P, Fut>(
    mut fetch: P,
    page_limit: usize,
    max_pages: usize,
) -> Result<Option<i64>, ProtocolError>
where
    P: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Vec<SignatureInfo>, ProtocolError>>,
{
    let mut before: Option<String> = None;
    let mut oldest: Option<i64> = None;

    for page_no in 0..max_pages {
        let page = match fetch(before.clone()).await {
            Ok(page) => page,
            Err(e) if page_no == 0 => return Err(e),
            Err(e) => {
                warn!(error = %e, "Creation time search stopped early");
                return Ok(oldest);
            }
        };
        if let Some(t) = page.iter().filter_map(|sig| sig.block_time).min() {
            oldest = Some(oldest.map_or(t, |o| o.min(t)));
        }
        if page.len() < page_limit {
            return Ok(oldest);
        }
        before = page.last().map(|sig| sig.signature.clone());
    }

    warn!(
        pages = max_pages,
        "History longer than search limit, creation time is approximate"
    );
    Ok(oldest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RpcConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.commitment, "confirmed");
        assert!(config.max_retries > 0);
    }

    #[test]
    fn test_request_serialization() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "getTransaction",
            params: json!(["sig", {"encoding": "jsonParsed"}]),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "getTransaction");
        assert_eq!(value["params"][1]["encoding"], "jsonParsed");
    }

    #[test]
    fn test_response_with_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid param"}}"#;
        let response: RpcResponse<Vec<SignatureInfo>> = serde_json::from_str(body).unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[test]
    fn test_signature_page_decoding() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":[
            {"signature":"a","slot":10,"blockTime":1700000000,"err":null,"memo":null,"confirmationStatus":"finalized"},
            {"signature":"b","slot":9,"blockTime":null,"err":{"InstructionError":[0,"Custom"]}}
        ]}"#;
        let response: RpcResponse<Vec<SignatureInfo>> = serde_json::from_str(body).unwrap();
        let page = response.result.unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].succeeded());
        assert_eq!(page[0].block_time, Some(1_700_000_000));
        assert!(!page[1].succeeded());
        assert_eq!(page[1].block_time, None);
    }

    #[tokio::test]
    async fn test_invalid_address_rejected_before_request() {
        let provider = RpcProvider::new(RpcConfig {
            url: "http://127.0.0.1:9".to_string(),
            max_retries: 0,
            ..RpcConfig::default()
        })
        .unwrap();
        let result = provider.get_signatures_for_address("not-a-key", None, 10).await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    fn sig(name: &str, block_time: i64) -> SignatureInfo {
        SignatureInfo {
            signature: name.to_string(),
            slot: 1,
            block_time: Some(block_time),
            err: None,
        }
    }

    /// History newest first, one signature per 100 s ending at `newest`.
    fn history(count: i64, newest: i64) -> Vec<SignatureInfo> {
        (0..count)
            .map(|i| sig(&format!("s{}", newest - i * 100), newest - i * 100))
            .collect()
    }

    /// Serves `history` in pages of `limit`, honouring the `before` cursor.
    fn pager(
        history: &[SignatureInfo],
        limit: usize,
    ) -> impl FnMut(Option<String>) -> std::future::Ready<Result<Vec<SignatureInfo>, ProtocolError>> + '_
    {
        move |before| {
            let from = before.map_or(0, |b| {
                history
                    .iter()
                    .position(|s| s.signature == b)
                    .map_or(history.len(), |i| i + 1)
            });
            std::future::ready(Ok(history[from..].iter().take(limit).cloned().collect()))
        }
    }

    fn times(signatures: &[SignatureInfo]) -> Vec<i64> {
        signatures.iter().filter_map(|s| s.block_time).collect()
    }

    #[tokio::test]
    async fn test_collect_stops_on_short_page() {
        let history = history(5, 500);
        let mut calls = 0;
        let mut pages = pager(&history, 3);
        let collected = collect_signatures(
            |before| {
                calls += 1;
                pages(before)
            },
            3,
            0,
            100,
        )
        .await
        .unwrap();

        assert_eq!(times(&collected), vec![100, 200, 300, 400, 500]);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_collect_stops_at_start_time() {
        let history = history(9, 900);
        let mut calls = 0;
        let mut pages = pager(&history, 3);
        let collected = collect_signatures(
            |before| {
                calls += 1;
                pages(before)
            },
            3,
            550,
            100,
        )
        .await
        .unwrap();

        // Second page [600, 500, 400] crosses the start; nothing older is requested.
        assert_eq!(times(&collected), vec![600, 700, 800, 900]);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_collect_skips_failed_signatures() {
        let mut history = history(4, 400);
        history[1].err = Some(json!({"InstructionError": [0, {"Custom": 1}]}));
        history[2].block_time = None;

        let collected = collect_signatures(pager(&history, 10), 10, 0, 100)
            .await
            .unwrap();
        let names: Vec<&str> = collected.iter().map(|s| s.signature.as_str()).collect();
        assert_eq!(names, vec!["s100", "s400"]);
    }

    #[tokio::test]
    async fn test_collect_keeps_newest_when_capped() {
        let history = history(5, 500);
        let collected = collect_signatures(pager(&history, 3), 3, 0, 2)
            .await
            .unwrap();
        assert_eq!(times(&collected), vec![400, 500]);

        let none = collect_signatures(pager(&history, 3), 3, 0, 0).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_collect_page_errors() {
        let first = collect_signatures(
            |_| std::future::ready(Err(ProtocolError::Status(503))),
            3,
            0,
            100,
        )
        .await;
        assert!(matches!(first, Err(ProtocolError::Status(503))));

        let history = history(6, 600);
        let mut pages = pager(&history, 3);
        let partial = collect_signatures(
            |before: Option<String>| {
                if before.is_some() {
                    std::future::ready(Err(ProtocolError::Status(429)))
                } else {
                    pages(before)
                }
            },
            3,
            0,
            100,
        )
        .await
        .unwrap();
        assert_eq!(times(&partial), vec![400, 500, 600]);
    }

    #[tokio::test]
    async fn test_oldest_block_time_across_pages() {
        let history = history(7, 700);
        let mut calls = 0;
        let mut pages = pager(&history, 3);
        let oldest = oldest_block_time(
            |before| {
                calls += 1;
                pages(before)
            },
            3,
            50,
        )
        .await
        .unwrap();
        assert_eq!(oldest, Some(100));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_oldest_block_time_page_cap() {
        let history = history(9, 900);
        let oldest = oldest_block_time(pager(&history, 3), 3, 2).await.unwrap();
        assert_eq!(oldest, Some(400));
    }

    #[tokio::test]
    async fn test_oldest_block_time_empty_history() {
        let oldest = oldest_block_time(pager(&[], 3), 3, 50).await.unwrap();
        assert_eq!(oldest, None);
    }

    #[tokio::test]
    async fn test_oldest_block_time_later_failure_keeps_partial() {
        let history = history(6, 600);
        let mut pages = pager(&history, 3);
        let oldest = oldest_block_time(
            |before: Option<String>| {
                if before.is_some() {
                    std::future::ready(Err(ProtocolError::Status(500)))
                } else {
                    pages(before)
                }
            },
            3,
            50,
        )
        .await
        .unwrap();
        assert_eq!(oldest, Some(400));
    }
}
