//! In-memory provider: `DashMap`-backed, brute-force cosine scan (spec §4.5,
//! "in-memory" backend). Grounded on the teacher's `InMemoryVectorStore`.

mod category;
mod category_item;
mod item;
mod resource;

pub use category::InMemoryCategoryRepository;
pub use category_item::InMemoryCategoryItemRepository;
pub use item::InMemoryItemRepository;
pub use resource::InMemoryResourceRepository;

use std::sync::Arc;

use crate::storage::RepositorySet;

/// Builds a complete [`RepositorySet`] backed entirely by in-memory maps.
pub fn repository_set() -> RepositorySet {
    RepositorySet {
        resources: Arc::new(InMemoryResourceRepository::new()),
        items: Arc::new(InMemoryItemRepository::new()),
        categories: Arc::new(InMemoryCategoryRepository::new()),
        category_items: Arc::new(InMemoryCategoryItemRepository::new()),
    }
}
