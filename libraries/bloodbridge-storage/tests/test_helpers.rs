//! Test helpers and fixtures for storage integration tests
//!
//! These helpers create test databases using REAL SQLite files (NOT in-memory)
//! so every pooled connection sees the same schema, indexes and data.

use bloodbridge_core::Document;
use bloodbridge_storage::SqliteDocumentStore;
use serde_json::Value;
use tempfile::TempDir;

/// Test store wrapper that cleans up on drop
pub struct TestDb {
    pub store: SqliteDocumentStore,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test store with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let store = SqliteDocumentStore::open(&db_url)
            .await
            .expect("Failed to open store");

        Self {
            store,
            _temp_dir: temp_dir,
        }
    }
}

/// Build a document from a `json!` object literal
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
