/// Core error types for BloodBridge
use thiserror::Error;

/// Result type alias using `BloodBridgeError`
pub type Result<T> = std::result::Result<T, BloodBridgeError>;

/// Core error type for BloodBridge
#[derive(Error, Debug)]
pub enum BloodBridgeError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Duplicate entry (unique constraint violation)
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),
}

impl BloodBridgeError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a duplicate entry error
    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for BloodBridgeError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
