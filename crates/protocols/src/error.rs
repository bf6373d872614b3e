use thiserror::Error;

/// Errors raised by RPC and protocol adapters.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Transport-level failure (connection, timeout, TLS, body decoding).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The JSON-RPC endpoint returned an error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
    },

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A field the decoder depends on is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A token amount could not be parsed or combined.
    #[error("invalid token amount: {0}")]
    InvalidAmount(String),

    /// An account address is not a valid public key.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ProtocolError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ProtocolError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ProtocolError::Status(code) => *code == 429 || *code >= 500,
            // -32005 node is behind, -32004 block not available
            ProtocolError::Rpc { code, .. } => matches!(code, -32005 | -32004),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProtocolError::Status(429).is_transient());
        assert!(ProtocolError::Status(503).is_transient());
        assert!(!ProtocolError::Status(404).is_transient());
        assert!(
            ProtocolError::Rpc {
                code: -32005,
                message: "behind".into()
            }
            .is_transient()
        );
        assert!(!ProtocolError::MissingField("meta").is_transient());
    }
}
