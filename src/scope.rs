//! Scope: the field tuple that partitions every record and request.
//!
//! A scope is a `BTreeMap<String, ScopeValue>`. Every [`crate::model`] record
//! carries one; every read filters by it; every write requires it. The legal
//! field set for a deployment is declared once via [`ScopeModel`]
//! (`user_config.model` in configuration, spec §6).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One scope field's value. Scope fields are small and hashable/orderable by
/// design — they exist to partition records, not to hold payload data.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl ScopeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScopeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScopeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeValue::String(s) => write!(f, "{s}"),
            ScopeValue::Int(i) => write!(f, "{i}"),
            ScopeValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ScopeValue {
    fn from(s: &str) -> Self {
        ScopeValue::String(s.to_string())
    }
}

impl From<String> for ScopeValue {
    fn from(s: String) -> Self {
        ScopeValue::String(s)
    }
}

impl From<i64> for ScopeValue {
    fn from(v: i64) -> Self {
        ScopeValue::Int(v)
    }
}

impl From<bool> for ScopeValue {
    fn from(v: bool) -> Self {
        ScopeValue::Bool(v)
    }
}

/// Concrete scope tuple attached to a record or a request (invariant I1).
pub type Scope = BTreeMap<String, ScopeValue>;

/// Declares which fields form the scope tuple for a deployment
/// (`user_config.model`, spec §6). Every record's scope must carry exactly
/// these keys; every `where` filter key must be one of them (or `key__in`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScopeModel {
    pub fields: Vec<String>,
}

impl ScopeModel {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// True if `scope` carries exactly the declared fields.
    pub fn is_complete(&self, scope: &Scope) -> bool {
        self.fields.len() == scope.len() && self.fields.iter().all(|f| scope.contains_key(f))
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// True when two scopes carry the same key/value pairs (used for I2–I4 checks
/// such as "item and its category share scope").
pub fn scopes_match(a: &Scope, b: &Scope) -> bool {
    a == b
}
