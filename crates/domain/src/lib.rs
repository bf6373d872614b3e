//! Domain model for swap-replay candle reconstruction.
//!
//! This crate holds the value objects and entities shared by every other
//! crate in the workspace:
//! - Prices and price observations derived from swaps
//! - Candle intervals and their boundary alignment
//! - Candles and their flat export record
//! - Pools and the volume rule used when aggregating trades

/// Domain entities.
pub mod entities;
/// Domain enumerations.
pub mod enums;
/// Domain error type.
pub mod error;
/// Immutable value objects.
pub mod value_objects;

pub use entities::{Candle, CandleRecord, Pool, PriceObservation};
pub use enums::{Protocol, VolumeRule};
pub use error::DomainError;
pub use value_objects::{CandleInterval, Price};
