//! Step 5: persist candidate items, resolve (or lazily create) their
//! categories, wire the edges, and compute item embeddings in batches
//! (spec §4.2).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::model::{normalize_category_name, CategoryItem, MemoryCategory, MemoryItem, Resource};
use crate::pipelines::support::cfg_str;
use crate::service::ServiceContext;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

use super::types::CandidateItem;

pub struct CategorizeItems {
    spec: StepSpec,
}

impl CategorizeItems {
    pub fn new(embed_llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new("categorize_items")
                .requires(["items_to_persist", "resource"])
                .produces(["items", "categories", "relations"])
                .capability(Capability::Llm)
                .capability(Capability::Db)
                .config("embed_llm_profile", embed_llm_profile),
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for CategorizeItems {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let resource: Resource = state
            .get_typed("resource")
            .ok_or_else(|| MemoryError::invalid_input("resource is required"))?;
        let candidates: Vec<CandidateItem> = state.get_typed("items_to_persist").unwrap_or_default();

        let embed_profile = cfg_str(&self.spec, "embed_llm_profile", "default");
        let embed_client = ctx.shared.llm.resolve_embed(embed_profile)?;

        let mut items = Vec::with_capacity(candidates.len());
        let mut categories: Vec<MemoryCategory> = Vec::new();
        let mut relations = Vec::new();

        for candidate in &candidates {
            ctx.check_cancelled()?;
            let mut item = MemoryItem::new(candidate.memory_type.clone(), candidate.summary.clone(), ctx.scope.clone());
            item.resource_id = Some(resource.id.clone());
            let created = ctx.shared.repos.items.create(item).await?;

            for hint in &candidate.category_hints {
                let normalized = normalize_category_name(hint);
                if normalized.is_empty() {
                    continue;
                }
                let category = match ctx.shared.repos.categories.get_by_normalized_name(&normalized, &ctx.scope).await? {
                    Some(existing) => existing,
                    None => {
                        let description = format!("Auto-created category for \"{hint}\"");
                        let mut new_category = MemoryCategory::new(hint.clone(), description.clone(), ctx.scope.clone());
                        let (embeddings, _usage) =
                            embed_client.embed(&[format!("{hint} {description}")]).await.map_err(MemoryError::from)?;
                        new_category.embedding = embeddings.into_iter().next();
                        ctx.shared.repos.categories.create(new_category).await?
                    }
                };
                if !categories.iter().any(|c: &MemoryCategory| c.id == category.id) {
                    categories.push(category.clone());
                }
                let edge = CategoryItem::new(created.id.clone(), category.id.clone(), ctx.scope.clone());
                let created_edge = ctx.shared.repos.category_items.create(edge).await?;
                relations.push(created_edge);
            }

            items.push(created);
        }

        let batch_size = embedding_batch_size(ctx, embed_profile);
        let snapshot = items.clone();
        for chunk in snapshot.chunks(batch_size) {
            ctx.check_cancelled()?;
            let texts: Vec<String> = chunk.iter().map(|i| i.summary.clone()).collect();
            if texts.is_empty() {
                continue;
            }
            let (vectors, _usage) = embed_client.embed(&texts).await.map_err(MemoryError::from)?;
            for (item, vector) in chunk.iter().zip(vectors.into_iter()) {
                let mut updated = item.clone();
                updated.embedding = Some(vector);
                let persisted = ctx.shared.repos.items.update(updated).await?;
                if let Some(slot) = items.iter_mut().find(|i| i.id == persisted.id) {
                    *slot = persisted;
                }
            }
        }

        state.set_typed("items", &items);
        state.set_typed("categories", &categories);
        state.set_typed("relations", &relations);
        Ok(())
    }
}

fn embedding_batch_size(ctx: &StepContext<'_, ServiceContext>, profile_name: &str) -> usize {
    ctx.shared
        .config
        .profile_table()
        .resolve_embed(profile_name)
        .map(|p| p.embed_batch_size.max(1))
        .unwrap_or(16)
}
