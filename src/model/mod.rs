//! Core data model: [`Resource`], [`MemoryItem`], [`MemoryCategory`], [`CategoryItem`].
//!
//! Every record carries a full [`crate::scope::Scope`] tuple (invariant I1).
//! See spec §3 for the lifecycle of each entity.

mod category;
mod category_item;
mod item;
mod resource;

pub use category::{normalize_category_name, MemoryCategory};
pub use category_item::CategoryItem;
pub use item::MemoryItem;
pub use resource::{Modality, Resource};

use chrono::{DateTime, Utc};

/// Generates a new record id (stable UUID string, spec §3/§6).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
