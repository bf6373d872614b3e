//! Candle construction from discrete swap price observations.
//!
//! This crate turns an unordered batch of [`PriceObservation`]s into a
//! regular series of fixed-width candles:
//! - Data-driven mode covering exactly the observed span
//! - Bounded mode returning a fixed number of candles
//! - Gap filling with flat synthetic candles
//! - Configurable volume aggregation
//!
//! Everything here is pure and synchronous; fetching observations lives in
//! the data crate.
//!
//! [`PriceObservation`]: candle_replay_domain::PriceObservation

/// Prelude module for convenient imports.
pub mod prelude;

/// Per-interval OHLCV accumulation.
pub mod accumulator;
/// Candle series construction.
pub mod builder;
/// Error types.
pub mod error;
/// Batch validation.
pub mod validation;

pub use builder::{CandleBuilder, build_candles, build_candles_bounded};
pub use error::BuildError;
