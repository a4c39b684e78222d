use async_trait::async_trait;
use dashmap::DashMap;

use crate::model::Resource;
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::repository::{ResourceRepository, Scored};
use crate::storage::similarity::cosine_similarity;

/// Pure in-memory resource store. Lost when dropped; no persistence.
pub struct InMemoryResourceRepository {
    data: DashMap<String, Resource>,
}

impl InMemoryResourceRepository {
    pub fn new() -> Self {
        Self { data: DashMap::new() }
    }
}

impl Default for InMemoryResourceRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Invariant I5: resource embeddings in one scope share a fixed dimensionality.
fn check_dimension(
    data: &DashMap<String, Resource>,
    self_id: &str,
    scope: &Scope,
    candidate: &Option<Vec<f32>>,
) -> Result<(), StorageError> {
    let Some(candidate) = candidate else { return Ok(()) };
    if let Some(existing_dim) = data
        .iter()
        .find(|r| r.key() != self_id && &r.scope == scope && r.embedding.is_some())
        .and_then(|r| r.embedding.as_ref().map(|e| e.len()))
    {
        if existing_dim != candidate.len() {
            return Err(StorageError::DimensionMismatch { expected: existing_dim, actual: candidate.len() });
        }
    }
    Ok(())
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn create(&self, resource: Resource) -> Result<Resource, StorageError> {
        check_dimension(&self.data, &resource.id, &resource.scope, &resource.embedding)?;
        self.data.insert(resource.id.clone(), resource.clone());
        Ok(resource)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<Resource>, StorageError> {
        Ok(self
            .data
            .get(id)
            .filter(|r| &r.scope == scope)
            .map(|r| r.clone()))
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<Resource>, StorageError> {
        Ok(self
            .data
            .iter()
            .filter(|r| where_.matches(&r.scope))
            .map(|r| r.clone())
            .collect())
    }

    async fn update(&self, resource: Resource) -> Result<Resource, StorageError> {
        if !self.data.contains_key(&resource.id) {
            return Err(StorageError::NotFound(resource.id));
        }
        check_dimension(&self.data, &resource.id, &resource.scope, &resource.embedding)?;
        self.data.insert(resource.id.clone(), resource.clone());
        Ok(resource)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        match self.data.get(id) {
            Some(r) if &r.scope == scope => {
                drop(r);
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
    ) -> Result<Vec<Scored<Resource>>, StorageError> {
        let mut scored: Vec<Scored<Resource>> = self
            .data
            .iter()
            .filter(|r| where_.matches(&r.scope))
            .filter_map(|r| {
                r.embedding
                    .as_ref()
                    .map(|e| Scored { record: r.clone(), score: cosine_similarity(embedding, e) })
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
    use crate::model::Modality;

    fn scope() -> Scope {
        let mut s = Scope::new();
        s.insert("user_id".to_string(), "alice".into());
        s
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let repo = InMemoryResourceRepository::new();
        let r = Resource::new("https://example.com/a", Modality::Document, scope());
        let id = r.id.clone();
        repo.create(r).await.unwrap();
        let fetched = repo.get_by_id(&id, &scope()).await.unwrap();
        assert!(fetched.is_some());
    }

    #[tokio::test]
    async fn get_with_wrong_scope_returns_none() {
        let repo = InMemoryResourceRepository::new();
        let r = Resource::new("https://example.com/a", Modality::Document, scope());
        let id = r.id.clone();
        repo.create(r).await.unwrap();
        let mut other = Scope::new();
        other.insert("user_id".to_string(), "bob".into());
        assert!(repo.get_by_id(&id, &other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn similarity_search_orders_by_score_desc() {
        let repo = InMemoryResourceRepository::new();
        let mut near = Resource::new("https://example.com/near", Modality::Document, scope());
        near.embedding = Some(vec![1.0, 0.0]);
        let mut far = Resource::new("https://example.com/far", Modality::Document, scope());
        far.embedding = Some(vec![0.0, 1.0]);
        repo.create(near.clone()).await.unwrap();
        repo.create(far).await.unwrap();

        let hits = repo
            .similarity_search(&[1.0, 0.0], 5, &WhereFilter::empty())
            .await
            .unwrap();
        assert_eq!(hits[0].record.id, near.id);
    }

    #[tokio::test]
    async fn delete_requires_matching_scope() {
        let repo = InMemoryResourceRepository::new();
        let r = Resource::new("https://example.com/a", Modality::Document, scope());
        let id = r.id.clone();
        repo.create(r).await.unwrap();
        let mut other = Scope::new();
        other.insert("user_id".to_string(), "bob".into());
        assert!(matches!(
            repo.delete(&id, &other).await.unwrap_err(),
            StorageError::ScopeMismatch(_)
        ));
        repo.delete(&id, &scope()).await.unwrap();
    }
}
