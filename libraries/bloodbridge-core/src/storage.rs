//! Record store contract

use crate::document::{Collection, Document};
use crate::error::Result;
use crate::filter::{Filter, FindOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of `insert_one`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    /// Always true once the store accepted the write
    pub acknowledged: bool,
    /// Identifier assigned to the new document
    pub inserted_id: String,
}

/// Outcome of `update_one`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// Always true once the store accepted the write
    pub acknowledged: bool,
    /// Documents matched by the filter (0 or 1)
    pub matched_count: u64,
    /// Documents actually changed (0 when the patch was a no-op)
    pub modified_count: u64,
}

/// Outcome of `delete_one`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// Always true once the store accepted the write
    pub acknowledged: bool,
    /// Documents removed (0 or 1)
    pub deleted_count: u64,
}

/// Record store gateway
///
/// CRUD and one numeric aggregate over the three named collections. Filters
/// are exact-match conjunctions; there are no transactions across
/// collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document; any `_id` it carries is replaced by a store-assigned one
    async fn insert_one(&self, collection: Collection, document: Document)
        -> Result<InsertOneResult>;

    /// First matching document in insertion order
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>>;

    /// Matching documents, paginated and ordered per `options`
    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>>;

    /// Number of matching documents
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64>;

    /// Apply `$set` semantics to the first matching document: every top-level
    /// key of `patch` replaces or adds that key
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Document,
    ) -> Result<UpdateResult>;

    /// Remove the first matching document
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult>;

    /// Sum of a numeric field across every document of a collection.
    /// Missing and non-numeric values contribute nothing.
    async fn sum_field(&self, collection: Collection, field: &str) -> Result<f64>;
}
