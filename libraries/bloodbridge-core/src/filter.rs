//! Exact-match filters and find options
//!
//! A [`Filter`] is a conjunction of field equalities. There are no range
//! queries, nested paths or joins; a store implementation only has to
//! understand "field == scalar".

use crate::error::{BloodBridgeError, Result};
use serde_json::Value;

/// Conjunction of exact-match field equalities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Empty filter (matches every document in the collection)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the store identifier
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq(crate::fields::ID, id.into())
    }

    /// Add `field == value`
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Add `field == value` when a value is present
    #[must_use]
    pub fn eq_opt<V: Into<Value>>(self, field: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    /// The conditions in insertion order
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Number of conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// True when the filter matches everything
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check every field name and value against what a store can match on.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in &self.conditions {
            validate_field_name(field)?;
            if value.is_array() || value.is_object() {
                return Err(BloodBridgeError::invalid_input(format!(
                    "filter on '{}' must compare against a scalar",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Field names are restricted to ASCII letters, digits and `_`.
pub fn validate_field_name(field: &str) -> Result<()> {
    if field.is_empty() {
        return Err(BloodBridgeError::invalid_input("empty field name"));
    }
    if !field
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(BloodBridgeError::invalid_input(format!(
            "invalid field name '{}'",
            field
        )));
    }
    Ok(())
}

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Insertion order
    #[default]
    Oldest,
    /// Reverse insertion order
    Newest,
}

/// Options for `find_many`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Number of matching documents to skip
    pub skip: u64,
    /// Maximum number of documents to return (`None` = all)
    pub limit: Option<u64>,
    /// Result ordering
    pub order: SortOrder,
}

impl FindOptions {
    /// Return everything, oldest first
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the ordering
    #[must_use]
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}
