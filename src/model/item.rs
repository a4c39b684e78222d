//! MemoryItem: one atomic extracted (or manually created) memory (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// One atomic extracted memory. Created by `extract_items` or
/// `create_memory_item`; mutated by `update_memory_item`; deleted by
/// `delete_memory_item`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: String,
    /// Null for items created by direct CRUD rather than by memorize.
    pub resource_id: Option<String>,
    /// One of the configured memory types (default: profile, event, knowledge, behavior).
    pub memory_type: String,
    pub summary: String,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scope: Scope,
}

impl MemoryItem {
    pub fn new(memory_type: impl Into<String>, summary: impl Into<String>, scope: Scope) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            resource_id: None,
            memory_type: memory_type.into(),
            summary: summary.into(),
            embedding: None,
            created_at: now,
            updated_at: now,
            scope,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = super::now();
    }
}
