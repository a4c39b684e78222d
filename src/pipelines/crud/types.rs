//! Shared CRUD response shape (spec §4.4: "Return `{memory_item,
//! category_updates[]}`").

use serde::{Deserialize, Serialize};

use crate::model::{MemoryCategory, MemoryItem};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemMutationResponse {
    pub memory_item: MemoryItem,
    pub category_updates: Vec<MemoryCategory>,
}
