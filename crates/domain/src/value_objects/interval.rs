use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// Width of a candle in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct CandleInterval(NonZeroU64);

impl CandleInterval {
    /// One-minute candles.
    pub const ONE_MINUTE: CandleInterval = CandleInterval(NonZeroU64::MIN.saturating_add(59));

    /// Creates an interval of `seconds` seconds.
    ///
    /// # Errors
    /// Returns [`DomainError::ZeroInterval`] when `seconds` is zero.
    pub fn from_secs(seconds: u64) -> Result<Self, DomainError> {
        NonZeroU64::new(seconds)
            .map(Self)
            .ok_or(DomainError::ZeroInterval)
    }

    /// Interval length in seconds.
    #[must_use]
    pub fn as_secs(&self) -> u64 {
        self.0.get()
    }

    /// Interval length as a signed value, saturating for absurdly wide intervals.
    #[must_use]
    pub fn as_secs_i64(&self) -> i64 {
        i64::try_from(self.0.get()).unwrap_or(i64::MAX)
    }

    /// Floors a Unix timestamp to the start of the interval containing it.
    ///
    /// Uses Euclidean division so timestamps before the epoch round down too.
    /// Returns `None` when the interval start would fall below `i64::MIN`.
    #[must_use]
    pub fn align(&self, timestamp: i64) -> Option<i64> {
        let width = self.as_secs_i64();
        timestamp.checked_sub(timestamp.rem_euclid(width))
    }
}

impl Default for CandleInterval {
    fn default() -> Self {
        Self::ONE_MINUTE
    }
}

impl TryFrom<u64> for CandleInterval {
    type Error = DomainError;

    fn try_from(seconds: u64) -> Result<Self, Self::Error> {
        Self::from_secs(seconds)
    }
}

impl From<CandleInterval> for u64 {
    fn from(interval: CandleInterval) -> Self {
        interval.as_secs()
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs())
    }
}
