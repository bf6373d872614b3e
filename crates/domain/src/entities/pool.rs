use crate::enums::Protocol;
use serde::{Deserialize, Serialize};

/// A liquidity pool pairing the tracked token with a quote token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pool {
    pub address: String,
    pub protocol: Protocol,
    pub base_mint: String,
    pub quote_mint: String,
}

impl Pool {
    pub fn new(
        address: impl Into<String>,
        protocol: Protocol,
        base_mint: impl Into<String>,
        quote_mint: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            protocol,
            base_mint: base_mint.into(),
            quote_mint: quote_mint.into(),
        }
    }

    /// Whether `mint` is one side of this pool.
    #[must_use]
    pub fn contains_mint(&self, mint: &str) -> bool {
        self.base_mint == mint || self.quote_mint == mint
    }
}
