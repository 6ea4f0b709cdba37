/// API route modules
pub mod access;
pub mod health;
pub mod payments;
pub mod requests;
pub mod stats;
pub mod users;

use crate::error::{Result, ServerError};
use bloodbridge_core::{BloodGroup, Document, Pagination};
use serde::Deserialize;
use serde_json::Value;

/// `page` and `size` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.size)
    }
}

/// Require a JSON object body
pub(crate) fn into_document(body: Value) -> Result<Document> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ServerError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
    }
}

/// Creation timestamp stored on new documents
pub(crate) fn timestamp_now() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

/// Treat `?status=` the same as an absent parameter
pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Parse `?bloodGroup=`. The raw value is kept untrimmed since an unencoded
/// `+` arrives as a trailing space.
pub(crate) fn blood_group_param(value: Option<&String>) -> Result<Option<BloodGroup>> {
    Ok(value
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<BloodGroup>())
        .transpose()?)
}
