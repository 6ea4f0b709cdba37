/// Storage-specific errors
use bloodbridge_core::BloodBridgeError;
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// A unique index rejected the write
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Filter or field name the store cannot evaluate
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Stored body is not a JSON object
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Classify a write failure, surfacing unique-index violations as
    /// `Duplicate`
    pub fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Duplicate(db_err.message().to_string())
            }
            _ => Self::Database(err),
        }
    }
}

impl From<BloodBridgeError> for StorageError {
    fn from(err: BloodBridgeError) -> Self {
        match err {
            BloodBridgeError::InvalidInput(msg) => Self::InvalidQuery(msg),
            BloodBridgeError::Serialization(e) => Self::Serialization(e),
            other => Self::InvalidQuery(other.to_string()),
        }
    }
}

impl From<StorageError> for BloodBridgeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(msg) => BloodBridgeError::duplicate(msg),
            StorageError::InvalidQuery(msg) => BloodBridgeError::invalid_input(msg),
            StorageError::Serialization(e) => BloodBridgeError::Serialization(e),
            StorageError::Database(e) => BloodBridgeError::from(e),
            StorageError::Migration(msg) => BloodBridgeError::storage(msg),
        }
    }
}
