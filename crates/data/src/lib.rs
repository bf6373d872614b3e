//! Observation collection and candle persistence.
//!
//! This crate sits between the protocol adapters and the candle builder:
//! - [`ObservationSource`] turns a pool's swap history into price observations
//! - [`export`] writes candles as CSV
//! - [`snapshot`] stores collected observations as JSON for offline rebuilds

/// CSV export of candles.
pub mod export;
/// Error types.
pub mod error;
/// JSON snapshots of collected observations.
pub mod snapshot;
/// Observation sources.
pub mod source;

pub use error::DataError;
pub use source::{ObservationSource, SourceConfig, SwapObservationSource, TransactionFeed};
