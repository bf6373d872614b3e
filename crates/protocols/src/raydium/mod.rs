//! Raydium AMM v4 adapter.
//!
//! This module provides functionality to work with Raydium pools:
//! - Discover pools trading a given mint
//! - Recognise swap instructions
//! - Derive execution prices from token balance deltas

/// Pool discovery through the public liquidity list.
pub mod pool_api;
/// Swap detection and price extraction.
pub mod swap;

pub use pool_api::{RaydiumApi, RaydiumApiConfig};
pub use swap::RaydiumSwapDecoder;

/// Raydium AMM v4 program ID (mainnet).
pub const AMM_V4_PROGRAM_ID: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

/// Authority owning every AMM v4 pool vault.
pub const AMM_V4_AUTHORITY: &str = "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1";

/// `SwapBaseIn` instruction tag.
pub const SWAP_BASE_IN_TAG: u8 = 9;

/// `SwapBaseOut` instruction tag.
pub const SWAP_BASE_OUT_TAG: u8 = 11;
