//! On-chain and off-chain protocol adapters.
//!
//! This crate provides the I/O glue that feeds the candle builder:
//! - A Solana JSON-RPC client for signature pagination and transaction fetches
//! - Raydium pool discovery through the public liquidity list
//! - Raydium swap detection and price extraction from token balance deltas

/// Error types.
pub mod error;
/// Raydium AMM adapter.
pub mod raydium;
/// Solana JSON-RPC client.
pub mod rpc;

pub use error::ProtocolError;
pub use raydium::{RaydiumApi, RaydiumSwapDecoder};
pub use rpc::{RpcConfig, RpcProvider};

use rpc::types::ParsedTransaction;

/// A swap recovered from a transaction's token balance changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapFill {
    /// Quote tokens per base token.
    pub price: f64,
    /// Base tokens exchanged.
    pub base_amount: f64,
    /// Quote tokens exchanged.
    pub quote_amount: f64,
}

/// Recognises swaps of one pool and derives their execution price.
pub trait SwapDecoder: Send + Sync {
    /// Whether the transaction contains a swap instruction for this pool's program.
    fn is_swap(&self, tx: &ParsedTransaction) -> bool;

    /// Extracts the fill of a swap transaction.
    ///
    /// Returns `Ok(None)` when the transaction moved no base tokens.
    ///
    /// # Errors
    /// Returns an error if token balances are missing or unparsable.
    fn extract_fill(&self, tx: &ParsedTransaction) -> Result<Option<SwapFill>, ProtocolError>;
}

/// Parses a base58 account address, rejecting anything that is not a valid public key.
///
/// # Errors
/// Returns [`ProtocolError::InvalidAddress`] on malformed input.
pub fn parse_address(address: &str) -> Result<solana_sdk::pubkey::Pubkey, ProtocolError> {
    address
        .parse()
        .map_err(|_| ProtocolError::InvalidAddress(address.to_string()))
}
