use thiserror::Error;

/// Errors raised while constructing domain values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A price was zero, negative, NaN or infinite.
    #[error("invalid price: {0}")]
    InvalidPrice(f64),

    /// A candle interval of zero seconds was requested.
    #[error("candle interval must be at least one second")]
    ZeroInterval,

    /// A textual enum value could not be parsed.
    #[error("unknown {kind}: {value}")]
    UnknownVariant {
        /// Name of the enum being parsed.
        kind: &'static str,
        /// Rejected input.
        value: String,
    },
}
