//! MemoryCategory: named topical bucket with a rolling LLM-maintained summary (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// Normalizes a category name for uniqueness comparison within a scope
/// (invariant I2): case-insensitive, whitespace-trimmed.
pub fn normalize_category_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Named topical bucket. Bootstrapped from configuration (lazily, on first
/// use within a scope) or created on demand when an item references an
/// unknown category name. `summary` is recomputed whenever its item set
/// changes (and set back to `None` if that recompute fails, spec §7).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub summary: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scope: Scope,
}

impl MemoryCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>, scope: Scope) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            name: name.into(),
            description: description.into(),
            summary: None,
            embedding: None,
            created_at: now,
            updated_at: now,
            scope,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_category_name(&self.name)
    }

    pub fn touch(&mut self) {
        self.updated_at = super::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_category_name("  Work Life \n"), "work life");
        assert_eq!(normalize_category_name("ACTIVITIES"), "activities");
    }

    #[test]
    fn differently_cased_names_normalize_equal() {
        assert_eq!(
            normalize_category_name("Preferences"),
            normalize_category_name(" preferences ")
        );
    }
}
