//! Compile exact-match filters into SQL

use bloodbridge_core::{fields, filter::validate_field_name, Collection, Filter};
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite};

use crate::error::{Result, StorageError};

/// JSON path for a top-level field. The name must already be validated.
pub(crate) fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

/// Append `WHERE collection = ? AND <conditions>` to `qb`.
pub(crate) fn push_where(
    qb: &mut QueryBuilder<'_, Sqlite>,
    collection: Collection,
    filter: &Filter,
) -> Result<()> {
    filter.validate()?;

    qb.push(" WHERE collection = ");
    qb.push_bind(collection.as_str());

    for (field, value) in filter.conditions() {
        if field == fields::ID {
            match value.as_str() {
                Some(id) => {
                    qb.push(" AND id = ");
                    qb.push_bind(id.to_string());
                }
                // Identifiers are always strings
                None => {
                    qb.push(" AND 0");
                }
            }
            continue;
        }

        qb.push(" AND json_extract(body, ");
        qb.push_bind(json_path(field));
        match value {
            Value::Null => {
                qb.push(") IS NULL");
            }
            Value::Bool(b) => {
                qb.push(") = ");
                qb.push_bind(i64::from(*b));
            }
            Value::Number(n) => {
                qb.push(") = ");
                if let Some(i) = n.as_i64() {
                    qb.push_bind(i);
                } else if let Some(f) = n.as_f64() {
                    qb.push_bind(f);
                } else {
                    return Err(StorageError::InvalidQuery(format!(
                        "unsupported number in filter on '{}'",
                        field
                    )));
                }
            }
            Value::String(s) => {
                qb.push(") = ");
                qb.push_bind(s.clone());
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(StorageError::InvalidQuery(format!(
                    "filter on '{}' must compare against a scalar",
                    field
                )));
            }
        }
    }

    Ok(())
}

/// Validated JSON path for a field written by an update
pub(crate) fn set_path(field: &str) -> Result<String> {
    validate_field_name(field)?;
    Ok(json_path(field))
}

/// Append `json_set(body, ?, json(?), ...)` for `(path, json text)` pairs.
/// Values go through `json()` so objects, arrays and `null` keep their type.
pub(crate) fn push_json_set(qb: &mut QueryBuilder<'_, Sqlite>, assignments: &[(String, String)]) {
    qb.push("json_set(body");
    for (path, value) in assignments {
        qb.push(", ");
        qb.push_bind(path.clone());
        qb.push(", json(");
        qb.push_bind(value.clone());
        qb.push(")");
    }
    qb.push(")");
}

/// Validated JSON path for an aggregate over `field`
pub(crate) fn aggregate_path(field: &str) -> Result<String> {
    validate_field_name(field)?;
    Ok(json_path(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_binds_every_value() {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT id FROM documents");
        let filter = Filter::new()
            .eq("email", "a@b.com")
            .eq("verified", true)
            .eq("amount", 50)
            .eq("note", Value::Null)
            .eq(fields::ID, "abc");
        push_where(&mut qb, Collection::Users, &filter).unwrap();

        assert_eq!(
            qb.sql(),
            "SELECT id FROM documents WHERE collection = ? \
             AND json_extract(body, ?) = ? \
             AND json_extract(body, ?) = ? \
             AND json_extract(body, ?) = ? \
             AND json_extract(body, ?) IS NULL \
             AND id = ?"
        );
    }

    #[test]
    fn test_non_string_id_matches_nothing() {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT id FROM documents");
        push_where(&mut qb, Collection::Requests, &Filter::new().eq(fields::ID, 7)).unwrap();
        assert!(qb.sql().ends_with(" AND 0"));
    }

    #[test]
    fn test_json_set_binds_paths_and_values() {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE documents SET body = ");
        let assignments = vec![
            (set_path("status").unwrap(), "\"blocked\"".to_string()),
            (set_path("note").unwrap(), "null".to_string()),
        ];
        push_json_set(&mut qb, &assignments);

        assert_eq!(
            qb.sql(),
            "UPDATE documents SET body = json_set(body, ?, json(?), ?, json(?))"
        );
        assert!(set_path("a.b").is_err());
    }

    #[test]
    fn test_rejects_unsafe_field_names() {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT id FROM documents");
        let filter = Filter::new().eq("email') OR 1=1 --", "x");
        assert!(push_where(&mut qb, Collection::Users, &filter).is_err());
        assert!(aggregate_path("amount").is_ok());
        assert!(aggregate_path("a.b").is_err());
    }
}
