//! BloodBridge Storage
//!
//! `SQLite` document store for BloodBridge.
//!
//! Every collection lives in one `documents` table: each row carries the
//! collection name, a store-assigned identifier and the document body as
//! JSON text. Exact-match filters are compiled to `json_extract` comparisons
//! with every path and value bound as a parameter.
//!
//! # Example
//!
//! ```rust,no_run
//! use bloodbridge_core::{Collection, DocumentStore, Filter};
//! use bloodbridge_storage::SqliteDocumentStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteDocumentStore::open("sqlite://bloodbridge.db").await?;
//!
//! let donors = store
//!     .count(Collection::Users, &Filter::new().eq("role", "donor"))
//!     .await?;
//! println!("{donors} donors");
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

pub mod documents;

pub use context::SqliteDocumentStore;
pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://bloodbridge.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url = %database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!("SQLite pool created");

    Ok(pool)
}
