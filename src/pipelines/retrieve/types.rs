//! Shared types threaded through the retrieve pipeline's state map (spec §4.3, §6).

use serde::{Deserialize, Serialize};

use crate::model::{MemoryCategory, MemoryItem, Resource};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryContent {
    pub text: String,
}

/// One turn in the `queries` list; the last entry is the "active query"
/// (spec §4.3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Query {
    pub role: String,
    pub content: QueryContent,
}

impl Query {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: QueryContent { text: text.into() } }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredCategory {
    pub category: MemoryCategory,
    pub score: Option<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: MemoryItem,
    pub score: Option<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredResource {
    pub resource: Resource,
    pub score: Option<f32>,
}

/// `retrieve`'s return shape (spec §6). `score` fields are populated only
/// in RAG mode (spec §4.3 "(G) Build").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub needs_retrieval: bool,
    pub original_query: String,
    pub rewritten_query: String,
    pub next_step_query: Option<String>,
    pub categories: Vec<ScoredCategory>,
    pub items: Vec<ScoredItem>,
    pub resources: Vec<ScoredResource>,
}
