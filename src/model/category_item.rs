//! CategoryItem: directed edge between one Item and one Category (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// Many-to-many edge: an item may belong to zero or more categories; a
/// category contains zero or more items (invariant I3: both endpoints exist
/// and share scope with the edge).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryItem {
    pub id: String,
    pub item_id: String,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scope: Scope,
}

impl CategoryItem {
    pub fn new(item_id: impl Into<String>, category_id: impl Into<String>, scope: Scope) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            item_id: item_id.into(),
            category_id: category_id.into(),
            created_at: now,
            updated_at: now,
            scope,
        }
    }
}
