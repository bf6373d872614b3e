use crate::error::ProtocolError;
use crate::raydium::AMM_V4_PROGRAM_ID;
use candle_replay_domain::{Pool, Protocol};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Categories of the liquidity list that may contain a pool.
const POOL_CATEGORIES: [&str; 3] = ["official", "unOfficial", "other"];

/// Configuration for the Raydium HTTP API.
#[derive(Debug, Clone)]
pub struct RaydiumApiConfig {
    /// URL of the AMM v4 liquidity list.
    pub liquidity_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RaydiumApiConfig {
    fn default() -> Self {
        Self {
            liquidity_url: "https://api.raydium.io/v2/sdk/liquidity/mainnet.json".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiquidityEntry {
    id: String,
    base_mint: String,
    quote_mint: String,
    #[serde(default)]
    program_id: Option<String>,
}

/// Client for Raydium's public liquidity list.
pub struct RaydiumApi {
    client: reqwest::Client,
    config: RaydiumApiConfig,
}

impl RaydiumApi {
    /// Creates a new client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: RaydiumApiConfig) -> Result<Self, ProtocolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Finds every AMM v4 pool in which `mint` is the base or the quote token.
    ///
    /// # Errors
    /// Returns an error if the list cannot be downloaded or decoded.
    pub async fn find_pools(&self, mint: &str) -> Result<Vec<Pool>, ProtocolError> {
        info!(mint, url = %self.config.liquidity_url, "Searching Raydium pools");
        let response = self.client.get(&self.config.liquidity_url).send().await?;
        if !response.status().is_success() {
            return Err(ProtocolError::Status(response.status().as_u16()));
        }
        let body: serde_json::Value = serde_json::from_slice(&response.bytes().await?)?;
        let pools = pools_for_mint(&body, mint)?;
        info!(mint, pools = pools.len(), "Pool search finished");
        Ok(pools)
    }
}

/// Extracts the pools trading `mint` from a liquidity list document.
///
/// Pools are oriented so that `mint` is always the base token, which makes
/// decoded prices read as quote tokens per `mint`.
///
/// # Errors
/// Returns an error if an entry of a known category is malformed.
pub fn pools_for_mint(list: &serde_json::Value, mint: &str) -> Result<Vec<Pool>, ProtocolError> {
    let mut pools = Vec::new();
    for category in POOL_CATEGORIES {
        let Some(entries) = list.get(category) else {
            continue;
        };
        let entries: Vec<LiquidityEntry> = serde_json::from_value(entries.clone())?;
        debug!(category, entries = entries.len(), "Scanning category");
        pools.extend(
            entries
                .into_iter()
                .filter(|e| e.base_mint == mint || e.quote_mint == mint)
                .filter(|e| e.program_id.as_deref().is_none_or(|p| p == AMM_V4_PROGRAM_ID))
                .map(|e| {
                    if e.base_mint == mint {
                        Pool::new(e.id, Protocol::Raydium, e.base_mint, e.quote_mint)
                    } else {
                        Pool::new(e.id, Protocol::Raydium, e.quote_mint, e.base_mint)
                    }
                }),
        );
    }
    Ok(pools)
}
