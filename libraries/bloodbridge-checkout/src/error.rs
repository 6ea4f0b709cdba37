//! Error types for the checkout client.

use thiserror::Error;

/// Errors that can occur when talking to the payment processor.
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Processor could not be reached, timed out, throttled us or failed
    /// on its side
    #[error("Payment processor unreachable: {0}")]
    Unreachable(String),

    /// The processor does not know this session
    #[error("Checkout session not found: {0}")]
    SessionNotFound(String),

    /// Processor rejected the request
    #[error("Payment processor error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse processor response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client misconfigured (base URL, secret key)
    #[error("Invalid checkout configuration: {0}")]
    InvalidConfig(String),
}

impl CheckoutError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

impl From<reqwest::Error> for CheckoutError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            // connect, timeout and transport failures
            Self::Unreachable(e.to_string())
        }
    }
}

/// Result type for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unreachable_is_transient() {
        assert!(CheckoutError::Unreachable("timeout".into()).is_transient());
        assert!(!CheckoutError::SessionNotFound("cs_x".into()).is_transient());
        assert!(!CheckoutError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
        assert!(!CheckoutError::Parse("eof".into()).is_transient());
        assert!(!CheckoutError::InvalidConfig("key".into()).is_transient());
    }
}
