//! Shared helpers for the relational and vector providers: scope-column
//! naming, `WHERE` clause assembly, and JSON (de)serialization of
//! non-tabular fields (scope tuples, embeddings).

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;

use crate::scope::{Scope, ScopeModel, ScopeValue};
use crate::storage::error::StorageError;
use crate::storage::filter::{FilterValue, WhereFilter};

/// SQL column name for a scope field. Scope fields are never user-supplied
/// SQL identifiers; they come from the deployment's [`ScopeModel`].
pub fn scope_column(field: &str) -> String {
    format!("scope_{field}")
}

pub fn scope_column_def(field: &str) -> String {
    format!("{} TEXT NOT NULL", scope_column(field))
}

/// Serializes a [`Scope`] both as a JSON blob (exact round trip, including
/// the `String`/`Int`/`Bool` distinction) and as a list of
/// `(column, display-text)` pairs for indexed equality filtering.
pub fn scope_columns_for_insert(model: &ScopeModel, scope: &Scope) -> Result<Vec<(String, String)>, StorageError> {
    model
        .fields
        .iter()
        .map(|f| {
            let value = scope
                .get(f)
                .ok_or_else(|| StorageError::ScopeMismatch(format!("scope missing field: {f}")))?;
            Ok((scope_column(f), value.to_string()))
        })
        .collect()
}

pub fn scope_to_json(scope: &Scope) -> Result<String, StorageError> {
    serde_json::to_string(scope).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub fn scope_from_json(raw: &str) -> Result<Scope, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub fn embedding_to_json(embedding: &Option<Vec<f32>>) -> Result<Option<String>, StorageError> {
    match embedding {
        Some(v) => Ok(Some(
            serde_json::to_string(v).map_err(|e| StorageError::Serialization(e.to_string()))?,
        )),
        None => Ok(None),
    }
}

pub fn embedding_from_json(raw: &Option<String>) -> Result<Option<Vec<f32>>, StorageError> {
    match raw {
        Some(s) => Ok(Some(
            serde_json::from_str(s).map_err(|e| StorageError::Serialization(e.to_string()))?,
        )),
        None => Ok(None),
    }
}

pub fn timestamp_to_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub fn timestamp_from_text(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Builds a `WHERE ...` SQL fragment (without the leading `WHERE`) and its
/// bound parameters from a validated [`WhereFilter`]. Returns `"1=1"` (plus
/// no params) when the filter has no conditions.
pub fn build_where_clause(filter: &WhereFilter) -> (String, Vec<SqlValue>) {
    if filter.conditions.is_empty() {
        return ("1=1".to_string(), Vec::new());
    }

    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for (field, cond) in &filter.conditions {
        let column = scope_column(field);
        match cond {
            FilterValue::Eq(v) => {
                clauses.push(format!("{column} = ?"));
                params.push(SqlValue::Text(v.to_string()));
            }
            FilterValue::In(values) => {
                let placeholders = values.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
                clauses.push(format!("{column} IN ({placeholders})"));
                for v in values {
                    params.push(SqlValue::Text(v.to_string()));
                }
            }
        }
    }
    (clauses.join(" AND "), params)
}

/// Compares a stored `ScopeValue` against the scope actually requested, used
/// wherever a row must be matched to an exact scope rather than a filter
/// (`get_by_id`, `update`, `delete`).
pub fn scope_equals_exact(stored: &Scope, requested: &Scope) -> bool {
    stored == requested
}

#[allow(dead_code)]
pub fn scope_value_to_sql(value: &ScopeValue) -> SqlValue {
    SqlValue::Text(value.to_string())
}

/// Invariant I5: embeddings for one role share a fixed dimensionality per
/// scope. Looks for any other row in `table` with the same `scope_json` and
/// a non-null embedding, and rejects `candidate` if its length disagrees.
pub fn check_embedding_dimension(
    conn: &rusqlite::Connection,
    table: &str,
    scope_json: &str,
    exclude_id: &str,
    candidate: &Option<Vec<f32>>,
) -> Result<(), StorageError> {
    let Some(candidate) = candidate else { return Ok(()) };
    let sql =
        format!("SELECT embedding FROM {table} WHERE scope_json = ?1 AND id != ?2 AND embedding IS NOT NULL LIMIT 1");
    let existing_raw: Option<String> = conn
        .query_row(&sql, rusqlite::params![scope_json, exclude_id], |r| r.get(0))
        .ok();
    if let Some(existing) = embedding_from_json(&existing_raw)? {
        if existing.len() != candidate.len() {
            return Err(StorageError::DimensionMismatch { expected: existing.len(), actual: candidate.len() });
        }
    }
    Ok(())
}
