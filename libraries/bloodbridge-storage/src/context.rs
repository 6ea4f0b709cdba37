use crate::{create_pool, documents, run_migrations, StorageError};
use async_trait::async_trait;
use bloodbridge_core::{
    error::Result, Collection, DeleteResult, Document, DocumentStore, Filter, FindOptions,
    InsertOneResult, UpdateResult,
};
use sqlx::SqlitePool;

/// `DocumentStore` backed by a shared `SQLite` pool
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date
    pub async fn open(database_url: &str) -> std::result::Result<Self, StorageError> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneResult> {
        Ok(documents::insert(&self.pool, collection, document).await?)
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        Ok(documents::find_one(&self.pool, collection, filter).await?)
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>> {
        Ok(documents::find_many(&self.pool, collection, filter, options).await?)
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        Ok(documents::count(&self.pool, collection, filter).await?)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Document,
    ) -> Result<UpdateResult> {
        Ok(documents::update_one(&self.pool, collection, filter, patch).await?)
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult> {
        Ok(documents::delete_one(&self.pool, collection, filter).await?)
    }

    async fn sum_field(&self, collection: Collection, field: &str) -> Result<f64> {
        Ok(documents::sum_field(&self.pool, collection, field).await?)
    }
}
