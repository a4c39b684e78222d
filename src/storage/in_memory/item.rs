use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::MemoryItem;
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::repository::{ItemRepository, Scored};
use crate::storage::similarity::cosine_similarity;

pub struct InMemoryItemRepository {
    data: DashMap<String, MemoryItem>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self { data: DashMap::new() }
    }
}

impl Default for InMemoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Invariant I5: item embeddings in one scope share a fixed dimensionality.
/// Rejects `candidate` if it disagrees in length with any other item's
/// embedding already stored in the same scope.
fn check_dimension(
    data: &DashMap<String, MemoryItem>,
    self_id: &str,
    scope: &Scope,
    candidate: &Option<Vec<f32>>,
) -> Result<(), StorageError> {
    let Some(candidate) = candidate else { return Ok(()) };
    if let Some(existing_dim) = data
        .iter()
        .find(|i| i.key() != self_id && &i.scope == scope && i.embedding.is_some())
        .and_then(|i| i.embedding.as_ref().map(|e| e.len()))
    {
        if existing_dim != candidate.len() {
            return Err(StorageError::DimensionMismatch { expected: existing_dim, actual: candidate.len() });
        }
    }
    Ok(())
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn create(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        check_dimension(&self.data, &item.id, &item.scope, &item.embedding)?;
        self.data.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<MemoryItem>, StorageError> {
        Ok(self.data.get(id).filter(|i| &i.scope == scope).map(|i| i.clone()))
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<MemoryItem>, StorageError> {
        Ok(self
            .data
            .iter()
            .filter(|i| where_.matches(&i.scope))
            .map(|i| i.clone())
            .collect())
    }

    async fn update(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        if !self.data.contains_key(&item.id) {
            return Err(StorageError::NotFound(item.id));
        }
        check_dimension(&self.data, &item.id, &item.scope, &item.embedding)?;
        self.data.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        match self.data.get(id) {
            Some(i) if &i.scope == scope => {
                drop(i);
                self.data.remove(id);
                Ok(())
            }
            Some(_) => Err(StorageError::ScopeMismatch(id.to_string())),
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        where_: &WhereFilter,
    ) -> Result<Vec<Scored<MemoryItem>>, StorageError> {
        let mut scored: Vec<Scored<MemoryItem>> = self
            .data
            .iter()
            .filter(|i| where_.matches(&i.scope))
            .filter_map(|i| {
                i.embedding
                    .as_ref()
                    .map(|e| Scored { record: i.clone(), score: cosine_similarity(embedding, e) })
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
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
    async fn update_requires_existing_record() {
        let repo = InMemoryItemRepository::new();
        let item = MemoryItem::new("profile", "likes tea", scope());
        assert!(matches!(
            repo.update(item).await.unwrap_err(),
            StorageError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn list_filters_by_scope() {
        let repo = InMemoryItemRepository::new();
        repo.create(MemoryItem::new("profile", "a", scope())).await.unwrap();
        let mut other = Scope::new();
        other.insert("user_id".to_string(), "bob".into());
        repo.create(MemoryItem::new("profile", "b", other)).await.unwrap();

        let filter = WhereFilter::empty().eq("user_id", "alice");
        let hits = repo.list(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].summary, "a");
    }

    #[tokio::test]
    async fn mismatched_embedding_dimension_in_same_scope_rejected() {
        let repo = InMemoryItemRepository::new();
        let mut first = MemoryItem::new("profile", "a", scope());
        first.embedding = Some(vec![1.0, 0.0]);
        repo.create(first).await.unwrap();

        let mut second = MemoryItem::new("profile", "b", scope());
        second.embedding = Some(vec![1.0, 0.0, 0.0]);
        assert!(matches!(
            repo.create(second).await.unwrap_err(),
            StorageError::DimensionMismatch { expected: 2, actual: 3 }
        ));
    }

    #[tokio::test]
    async fn mismatched_embedding_dimension_in_different_scope_allowed() {
        let repo = InMemoryItemRepository::new();
        let mut first = MemoryItem::new("profile", "a", scope());
        first.embedding = Some(vec![1.0, 0.0]);
        repo.create(first).await.unwrap();

        let mut other = Scope::new();
        other.insert("user_id".to_string(), "bob".into());
        let mut second = MemoryItem::new("profile", "b", other);
        second.embedding = Some(vec![1.0, 0.0, 0.0]);
        repo.create(second).await.unwrap();
    }
}
