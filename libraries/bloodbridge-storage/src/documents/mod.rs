//! Document queries
//!
//! Free functions over a pool, one per store operation. `SqliteDocumentStore`
//! delegates to these.

mod filter_sql;

use crate::error::{Result, StorageError};
use bloodbridge_core::{
    fields, Collection, DeleteResult, Document, DocumentId, Filter, FindOptions, InsertOneResult,
    SortOrder, UpdateResult,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use filter_sql::{aggregate_path, push_json_set, push_where, set_path};

/// Insert a document under a freshly generated identifier
pub async fn insert(
    pool: &SqlitePool,
    collection: Collection,
    mut document: Document,
) -> Result<InsertOneResult> {
    document.remove(fields::ID);
    let id = DocumentId::generate();
    let body = serde_json::to_string(&document)?;

    sqlx::query("INSERT INTO documents (id, collection, body, created_at) VALUES (?, ?, ?, ?)")
        .bind(id.as_str())
        .bind(collection.as_str())
        .bind(body)
        .bind(Utc::now().timestamp_millis())
        .execute(pool)
        .await
        .map_err(StorageError::from_write)?;

    tracing::debug!(collection = %collection, id = %id, "Inserted document");

    Ok(InsertOneResult {
        acknowledged: true,
        inserted_id: id.to_string(),
    })
}

/// First match in insertion order
pub async fn find_one(
    pool: &SqlitePool,
    collection: Collection,
    filter: &Filter,
) -> Result<Option<Document>> {
    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT id, body FROM documents");
    push_where(&mut qb, collection, filter)?;
    qb.push(" ORDER BY seq ASC LIMIT 1");

    let row = qb.build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_document).transpose()
}

/// Matches, ordered and paginated
pub async fn find_many(
    pool: &SqlitePool,
    collection: Collection,
    filter: &Filter,
    options: FindOptions,
) -> Result<Vec<Document>> {
    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT id, body FROM documents");
    push_where(&mut qb, collection, filter)?;

    qb.push(match options.order {
        SortOrder::Oldest => " ORDER BY seq ASC",
        SortOrder::Newest => " ORDER BY seq DESC",
    });

    // SQLite needs a LIMIT before OFFSET; -1 means unbounded
    qb.push(" LIMIT ");
    qb.push_bind(options.limit.map_or(-1, clamp_i64));
    qb.push(" OFFSET ");
    qb.push_bind(clamp_i64(options.skip));

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(row_to_document).collect()
}

/// Number of matches
pub async fn count(pool: &SqlitePool, collection: Collection, filter: &Filter) -> Result<u64> {
    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM documents");
    push_where(&mut qb, collection, filter)?;

    let row = qb.build().fetch_one(pool).await?;
    let count: i64 = row.try_get(0)?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// `$set` the patch onto the first match.
///
/// The match and the write happen in one `UPDATE`, so a concurrent writer
/// waits on the database lock and then sees the committed document. A
/// filter that pins the current value (compare-and-set) matches nothing
/// once another writer has changed it.
pub async fn update_one(
    pool: &SqlitePool,
    collection: Collection,
    filter: &Filter,
    patch: Document,
) -> Result<UpdateResult> {
    let assignments: Vec<(String, String)> = patch
        .into_iter()
        .filter(|(key, _)| key != fields::ID)
        .map(|(key, value)| -> Result<(String, String)> {
            let path = set_path(&key)?;
            Ok((path, serde_json::to_string(&value)?))
        })
        .collect::<Result<_>>()?;

    if assignments.is_empty() {
        let matched = exists(pool, collection, filter).await?;
        return Ok(UpdateResult {
            acknowledged: true,
            matched_count: u64::from(matched),
            modified_count: 0,
        });
    }

    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE documents SET body = ");
    push_json_set(&mut qb, &assignments);
    qb.push(" WHERE seq = (SELECT seq FROM documents");
    push_where(&mut qb, collection, filter)?;
    qb.push(" ORDER BY seq ASC LIMIT 1) AND ");
    push_json_set(&mut qb, &assignments);
    qb.push(" IS NOT json(body)");

    let result = qb
        .build()
        .execute(pool)
        .await
        .map_err(StorageError::from_write)?;

    if result.rows_affected() > 0 {
        tracing::debug!(collection = %collection, "Updated document");
        return Ok(UpdateResult {
            acknowledged: true,
            matched_count: 1,
            modified_count: 1,
        });
    }

    // Nothing written: either no match, or the patch changes nothing
    let matched = exists(pool, collection, filter).await?;
    Ok(UpdateResult {
        acknowledged: true,
        matched_count: u64::from(matched),
        modified_count: 0,
    })
}

/// Remove the first match
pub async fn delete_one(
    pool: &SqlitePool,
    collection: Collection,
    filter: &Filter,
) -> Result<DeleteResult> {
    let mut qb: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("DELETE FROM documents WHERE seq = (SELECT seq FROM documents");
    push_where(&mut qb, collection, filter)?;
    qb.push(" ORDER BY seq ASC LIMIT 1)");

    let result = qb.build().execute(pool).await?;

    Ok(DeleteResult {
        acknowledged: true,
        deleted_count: result.rows_affected(),
    })
}

/// Sum of the numeric values of `field`; other JSON types contribute nothing
pub async fn sum_field(pool: &SqlitePool, collection: Collection, field: &str) -> Result<f64> {
    let path = aggregate_path(field)?;

    let total: f64 = sqlx::query_scalar(
        "SELECT TOTAL(CASE WHEN json_type(body, ?) IN ('integer', 'real') \
         THEN json_extract(body, ?) END) \
         FROM documents WHERE collection = ?",
    )
    .bind(&path)
    .bind(&path)
    .bind(collection.as_str())
    .fetch_one(pool)
    .await?;

    Ok(total)
}

fn row_to_document(row: &SqliteRow) -> Result<Document> {
    let id: String = row.try_get("id")?;
    let body: String = row.try_get("body")?;

    let mut document: Document = match serde_json::from_str(&body)? {
        Value::Object(map) => map,
        _ => {
            return Err(StorageError::InvalidQuery(format!(
                "document {} is not a JSON object",
                id
            )))
        }
    };
    document.insert(fields::ID.to_string(), Value::String(id));
    Ok(document)
}

/// Whether any document matches
async fn exists(pool: &SqlitePool, collection: Collection, filter: &Filter) -> Result<bool> {
    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT 1 FROM documents");
    push_where(&mut qb, collection, filter)?;
    qb.push(" LIMIT 1");

    Ok(qb.build().fetch_optional(pool).await?.is_some())
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
