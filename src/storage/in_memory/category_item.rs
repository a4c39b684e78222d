use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::CategoryItem;
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::repository::CategoryItemRepository;

pub struct InMemoryCategoryItemRepository {
    data: DashMap<String, CategoryItem>,
}

impl InMemoryCategoryItemRepository {
    pub fn new() -> Self {
        Self { data: DashMap::new() }
    }
}

impl Default for InMemoryCategoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CategoryItemRepository for InMemoryCategoryItemRepository {
    async fn create(&self, edge: CategoryItem) -> Result<CategoryItem, StorageError> {
        self.data.insert(edge.id.clone(), edge.clone());
        Ok(edge)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<CategoryItem>, StorageError> {
        Ok(self.data.get(id).filter(|e| &e.scope == scope).map(|e| e.clone()))
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<CategoryItem>, StorageError> {
        Ok(self
            .data
            .iter()
            .filter(|e| where_.matches(&e.scope))
            .map(|e| e.clone())
            .collect())
    }

    async fn list_by_item(&self, item_id: &str, scope: &Scope) -> Result<Vec<CategoryItem>, StorageError> {
        Ok(self
            .data
            .iter()
            .filter(|e| e.item_id == item_id && &e.scope == scope)
            .map(|e| e.clone())
            .collect())
    }

    async fn list_by_category(
        &self,
        category_id: &str,
        scope: &Scope,
    ) -> Result<Vec<CategoryItem>, StorageError> {
        Ok(self
            .data
            .iter()
            .filter(|e| e.category_id == category_id && &e.scope == scope)
            .map(|e| e.clone())
            .collect())
    }

    async fn update(&self, edge: CategoryItem) -> Result<CategoryItem, StorageError> {
        if !self.data.contains_key(&edge.id) {
            return Err(StorageError::NotFound(edge.id));
        }
        self.data.insert(edge.id.clone(), edge.clone());
        Ok(edge)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        match self.data.get(id) {
            Some(e) if &e.scope == scope => {
                drop(e);
                self.data.remove(id);
                Ok(())
            }
            Some(_) => Err(StorageError::ScopeMismatch(id.to_string())),
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    async fn delete_by_item(&self, item_id: &str, scope: &Scope) -> Result<Vec<CategoryItem>, StorageError> {
        let removed: Vec<CategoryItem> = self
            .data
            .iter()
            .filter(|e| e.item_id == item_id && &e.scope == scope)
            .map(|e| e.clone())
            .collect();
        for edge in &removed {
            self.data.remove(&edge.id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        let mut s = Scope::new();
        s.insert("user_id".to_string(), "alice".into());
        s
    }

    #[tokio::test]
    async fn delete_by_item_removes_every_edge_for_that_item() {
        let repo = InMemoryCategoryItemRepository::new();
        repo.create(CategoryItem::new("item-1", "cat-1", scope())).await.unwrap();
        repo.create(CategoryItem::new("item-1", "cat-2", scope())).await.unwrap();
        repo.create(CategoryItem::new("item-2", "cat-1", scope())).await.unwrap();

        let removed = repo.delete_by_item("item-1", &scope()).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(repo.list_by_item("item-1", &scope()).await.unwrap().len(), 0);
        assert_eq!(repo.list_by_item("item-2", &scope()).await.unwrap().len(), 1);
    }
}
