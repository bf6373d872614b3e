//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use candle_replay_builder::prelude::*;
//! ```

// Builder
pub use crate::builder::{CandleBuilder, build_candles, build_candles_bounded};

// Errors
pub use crate::error::BuildError;

// Domain types needed to call the builder
pub use candle_replay_domain::{Candle, CandleInterval, Price, PriceObservation, VolumeRule};
