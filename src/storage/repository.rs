//! Repository protocol: the uniform interface behind all three providers (spec §4.5).

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{CategoryItem, MemoryCategory, MemoryItem, Resource};
use crate::scope::Scope;

use super::error::StorageError;
use super::filter::WhereFilter;

/// A record paired with its similarity score against a query embedding.
#[derive(Clone, Debug)]
pub struct Scored<T> {
    pub record: T,
    pub score: f32,
}

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn create(&self, resource: Resource) -> Result<Resource, StorageError>;
    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<Resource>, StorageError>;
    async fn list(&self, where_: &WhereFilter) -> Result<Vec<Resource>, StorageError>;
    async fn update(&self, resource: Resource) -> Result<Resource, StorageError>;
    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError>;
    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        where_: &WhereFilter,
    ) -> Result<Vec<Scored<Resource>>, StorageError>;
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn create(&self, item: MemoryItem) -> Result<MemoryItem, StorageError>;
    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<MemoryItem>, StorageError>;
    async fn list(&self, where_: &WhereFilter) -> Result<Vec<MemoryItem>, StorageError>;
    async fn update(&self, item: MemoryItem) -> Result<MemoryItem, StorageError>;
    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError>;
    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        where_: &WhereFilter,
    ) -> Result<Vec<Scored<MemoryItem>>, StorageError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: MemoryCategory) -> Result<MemoryCategory, StorageError>;
    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<MemoryCategory>, StorageError>;
    /// Looks up a category by its normalized name within a scope (invariant I2).
    async fn get_by_normalized_name(
        &self,
        normalized_name: &str,
        scope: &Scope,
    ) -> Result<Option<MemoryCategory>, StorageError>;
    async fn list(&self, where_: &WhereFilter) -> Result<Vec<MemoryCategory>, StorageError>;
    async fn update(&self, category: MemoryCategory) -> Result<MemoryCategory, StorageError>;
    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError>;
    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        where_: &WhereFilter,
    ) -> Result<Vec<Scored<MemoryCategory>>, StorageError>;
}

#[async_trait]
pub trait CategoryItemRepository: Send + Sync {
    async fn create(&self, edge: CategoryItem) -> Result<CategoryItem, StorageError>;
    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<CategoryItem>, StorageError>;
    async fn list(&self, where_: &WhereFilter) -> Result<Vec<CategoryItem>, StorageError>;
    async fn list_by_item(&self, item_id: &str, scope: &Scope) -> Result<Vec<CategoryItem>, StorageError>;
    async fn list_by_category(&self, category_id: &str, scope: &Scope) -> Result<Vec<CategoryItem>, StorageError>;
    async fn update(&self, edge: CategoryItem) -> Result<CategoryItem, StorageError>;
    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError>;
    async fn delete_by_item(&self, item_id: &str, scope: &Scope) -> Result<Vec<CategoryItem>, StorageError>;
}

/// The four repositories a `MemoryService` wires together, chosen per
/// `database_config.metadata_store.provider` (spec §6).
#[derive(Clone)]
pub struct RepositorySet {
    pub resources: Arc<dyn ResourceRepository>,
    pub items: Arc<dyn ItemRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub category_items: Arc<dyn CategoryItemRepository>,
}
