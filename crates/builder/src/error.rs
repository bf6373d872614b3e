use thiserror::Error;

/// Errors returned by the candle builder.
///
/// An empty observation batch is not an error; it yields an empty series.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    /// An observation failed validation; the whole batch is rejected.
    #[error("observation #{index} at {timestamp} is invalid: {reason}")]
    InvalidObservation {
        /// Position of the offending observation in the input slice.
        index: usize,
        /// Its timestamp.
        timestamp: i64,
        /// What was wrong with it.
        reason: String,
    },

    /// An interval start could not be represented as a UTC date-time.
    #[error("interval start {0} is outside the representable time range")]
    TimestampOutOfRange(i64),
}
