//! `where` filter: scope-constrained, schema-validated query predicate (spec §4.3, §6).
//!
//! Every key must name a field of the deployment's [`ScopeModel`]; `key__in`
//! is accepted for list membership. Anything else rejects with
//! `InvalidFilter` before touching storage.

use std::collections::BTreeMap;

use crate::scope::{Scope, ScopeModel, ScopeValue};

use super::error::StorageError;

#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Eq(ScopeValue),
    In(Vec<ScopeValue>),
}

/// A validated `where` clause: base field name -> condition.
#[derive(Clone, Debug, Default)]
pub struct WhereFilter {
    pub conditions: BTreeMap<String, FilterValue>,
}

impl WhereFilter {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<ScopeValue>) -> Self {
        self.conditions.insert(field.into(), FilterValue::Eq(value.into()));
        self
    }

    /// Parses a raw `{field or field__in: value}` map, validating every key
    /// against `model`. Unknown keys reject with `InvalidFilter`.
    pub fn parse(
        raw: &BTreeMap<String, ScopeValue>,
        in_raw: &BTreeMap<String, Vec<ScopeValue>>,
        model: &ScopeModel,
    ) -> Result<Self, StorageError> {
        let mut conditions = BTreeMap::new();
        for (key, value) in raw {
            if !model.contains_field(key) {
                return Err(StorageError::InvalidFilter(format!(
                    "unknown scope field: {key}"
                )));
            }
            conditions.insert(key.clone(), FilterValue::Eq(value.clone()));
        }
        for (key, values) in in_raw {
            let base = key
                .strip_suffix("__in")
                .ok_or_else(|| StorageError::InvalidFilter(format!("expected __in suffix: {key}")))?;
            if !model.contains_field(base) {
                return Err(StorageError::InvalidFilter(format!(
                    "unknown scope field: {base}"
                )));
            }
            conditions.insert(base.to_string(), FilterValue::In(values.clone()));
        }
        Ok(Self { conditions })
    }

    /// True if `scope` satisfies every condition in this filter. Fields not
    /// mentioned by the filter are unconstrained.
    pub fn matches(&self, scope: &Scope) -> bool {
        self.conditions.iter().all(|(field, cond)| {
            let Some(actual) = scope.get(field) else {
                return false;
            };
            match cond {
                FilterValue::Eq(v) => actual == v,
                FilterValue::In(vs) => vs.contains(actual),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_unknown_field() {
        let model = ScopeModel::new(["user_id"]);
        let mut raw = BTreeMap::new();
        raw.insert("tenant_id".to_string(), ScopeValue::from("x"));
        let err = WhereFilter::parse(&raw, &BTreeMap::new(), &model).unwrap_err();
        assert!(matches!(err, StorageError::InvalidFilter(_)));
    }

    #[test]
    fn parse_accepts_in_suffix_for_known_field() {
        let model = ScopeModel::new(["user_id"]);
        let mut in_raw = BTreeMap::new();
        in_raw.insert(
            "user_id__in".to_string(),
            vec![ScopeValue::from("alice"), ScopeValue::from("bob")],
        );
        let filter = WhereFilter::parse(&BTreeMap::new(), &in_raw, &model).unwrap();
        let mut scope = Scope::new();
        scope.insert("user_id".to_string(), ScopeValue::from("bob"));
        assert!(filter.matches(&scope));
    }

    #[test]
    fn matches_requires_all_conditions() {
        let filter = WhereFilter::empty().eq("user_id", "alice").eq("agent_id", "a1");
        let mut scope = Scope::new();
        scope.insert("user_id".to_string(), ScopeValue::from("alice"));
        assert!(!filter.matches(&scope));
        scope.insert("agent_id".to_string(), ScopeValue::from("a1"));
        assert!(filter.matches(&scope));
    }

    #[test]
    fn empty_filter_matches_anything() {
        assert!(WhereFilter::empty().matches(&Scope::new()));
    }
}
