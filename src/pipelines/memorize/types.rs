//! Shared types threaded through the memorize pipeline's state map.

use serde::{Deserialize, Serialize};

use crate::model::{CategoryItem, MemoryCategory, MemoryItem, Resource};

/// One candidate memory surfaced by `extract_items`, before dedup/persist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateItem {
    pub memory_type: String,
    pub summary: String,
    #[serde(default)]
    pub category_hints: Vec<String>,
}

/// `build_response`'s output (spec §4.2 step 7, §6 `memorize` return shape).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemorizeResponse {
    pub resource: Resource,
    pub items: Vec<MemoryItem>,
    pub categories: Vec<MemoryCategory>,
    pub relations: Vec<CategoryItem>,
}
