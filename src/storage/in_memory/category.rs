use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::MemoryCategory;
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::repository::{CategoryRepository, Scored};
use crate::storage::similarity::cosine_similarity;

pub struct InMemoryCategoryRepository {
    data: DashMap<String, MemoryCategory>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self { data: DashMap::new() }
    }
}

impl Default for InMemoryCategoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Invariant I5: category embeddings in one scope share a fixed dimensionality.
fn check_dimension(
    data: &DashMap<String, MemoryCategory>,
    self_id: &str,
    scope: &Scope,
    candidate: &Option<Vec<f32>>,
) -> Result<(), StorageError> {
    let Some(candidate) = candidate else { return Ok(()) };
    if let Some(existing_dim) = data
        .iter()
        .find(|c| c.key() != self_id && &c.scope == scope && c.embedding.is_some())
        .and_then(|c| c.embedding.as_ref().map(|e| e.len()))
    {
        if existing_dim != candidate.len() {
            return Err(StorageError::DimensionMismatch { expected: existing_dim, actual: candidate.len() });
        }
    }
    Ok(())
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn create(&self, category: MemoryCategory) -> Result<MemoryCategory, StorageError> {
        if let Some(existing) = self
            .data
            .iter()
            .find(|c| c.scope == category.scope && c.normalized_name() == category.normalized_name())
        {
            return Err(StorageError::DuplicateCategoryName(existing.name.clone()));
        }
        check_dimension(&self.data, &category.id, &category.scope, &category.embedding)?;
        self.data.insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<MemoryCategory>, StorageError> {
        Ok(self.data.get(id).filter(|c| &c.scope == scope).map(|c| c.clone()))
    }

    async fn get_by_normalized_name(
        &self,
        normalized_name: &str,
        scope: &Scope,
    ) -> Result<Option<MemoryCategory>, StorageError> {
        Ok(self
            .data
            .iter()
            .find(|c| &c.scope == scope && c.normalized_name() == normalized_name)
            .map(|c| c.clone()))
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<MemoryCategory>, StorageError> {
        Ok(self
            .data
            .iter()
            .filter(|c| where_.matches(&c.scope))
            .map(|c| c.clone())
            .collect())
    }

    async fn update(&self, category: MemoryCategory) -> Result<MemoryCategory, StorageError> {
        if !self.data.contains_key(&category.id) {
            return Err(StorageError::NotFound(category.id));
        }
        if let Some(existing) = self.data.iter().find(|c| {
            c.id != category.id
                && c.scope == category.scope
                && c.normalized_name() == category.normalized_name()
        }) {
            return Err(StorageError::DuplicateCategoryName(existing.name.clone()));
        }
        check_dimension(&self.data, &category.id, &category.scope, &category.embedding)?;
        self.data.insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        match self.data.get(id) {
            Some(c) if &c.scope == scope => {
                drop(c);
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
    ) -> Result<Vec<Scored<MemoryCategory>>, StorageError> {
        let mut scored: Vec<Scored<MemoryCategory>> = self
            .data
            .iter()
            .filter(|c| where_.matches(&c.scope))
            .filter_map(|c| {
                c.embedding
                    .as_ref()
                    .map(|e| Scored { record: c.clone(), score: cosine_similarity(embedding, e) })
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
    async fn duplicate_name_in_same_scope_rejected() {
        let repo = InMemoryCategoryRepository::new();
        repo.create(MemoryCategory::new("Work", "work stuff", scope()))
            .await
            .unwrap();
        let dup = MemoryCategory::new("  work ", "other desc", scope());
        assert!(matches!(
            repo.create(dup).await.unwrap_err(),
            StorageError::DuplicateCategoryName(_)
        ));
    }

    #[tokio::test]
    async fn same_name_allowed_in_different_scope() {
        let repo = InMemoryCategoryRepository::new();
        repo.create(MemoryCategory::new("Work", "a", scope())).await.unwrap();
        let mut other = Scope::new();
        other.insert("user_id".to_string(), "bob".into());
        repo.create(MemoryCategory::new("Work", "b", other)).await.unwrap();
    }
}
