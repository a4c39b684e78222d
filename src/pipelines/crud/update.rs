//! `update_memory_item`: at least one changed field required; content
//! changes recompute the embedding; category diffs add/remove edges and
//! resummarize the union of old and new categories (spec §4.4).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::model::CategoryItem;
use crate::pipelines::support::cfg_str;
use crate::service::ServiceContext;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

use super::support::{get_or_create_category, resummarize_all};
use super::types::ItemMutationResponse;

pub struct UpdateMemoryItem {
    spec: StepSpec,
}

impl UpdateMemoryItem {
    pub fn new(embed_llm_profile: &str, category_update_llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new("update_memory_item")
                .requires(["item_id"])
                .produces(["response"])
                .capability(Capability::Llm)
                .capability(Capability::Db)
                .config("embed_llm_profile", embed_llm_profile)
                .config("category_update_llm_profile", category_update_llm_profile),
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for UpdateMemoryItem {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let item_id: String = state.get_typed("item_id").ok_or_else(|| MemoryError::invalid_input("item_id is required"))?;
        let memory_type: Option<String> = state.get_typed("memory_type");
        let content: Option<String> = state.get_typed("content");
        let category_names: Option<Vec<String>> = state.get_typed("category_names");

        let mut item = ctx
            .shared
            .repos
            .items
            .get_by_id(&item_id, &ctx.scope)
            .await?
            .ok_or_else(|| MemoryError::invalid_input(format!("memory item not found: {item_id}")))?;

        if let Some(memory_type) = memory_type {
            item.memory_type = memory_type;
        }

        if let Some(content) = content {
            let embed_profile = cfg_str(&self.spec, "embed_llm_profile", "default");
            let embed_client = ctx.shared.llm.resolve_embed(embed_profile)?;
            let (mut vectors, _usage) = embed_client.embed(&[content.clone()]).await.map_err(MemoryError::from)?;
            item.embedding = vectors.pop();
            item.summary = content;
        }

        let mut touched_categories = Vec::new();
        if let Some(new_names) = category_names {
            let existing_edges = ctx.shared.repos.category_items.list_by_item(&item_id, &ctx.scope).await?;
            let mut old_categories = Vec::with_capacity(existing_edges.len());
            for edge in &existing_edges {
                if let Some(category) = ctx.shared.repos.categories.get_by_id(&edge.category_id, &ctx.scope).await? {
                    old_categories.push(category);
                }
            }

            let mut new_categories = Vec::with_capacity(new_names.len());
            for name in &new_names {
                new_categories.push(get_or_create_category(ctx, name).await?);
            }

            let new_ids: std::collections::BTreeSet<String> = new_categories.iter().map(|c| c.id.clone()).collect();
            let old_ids: std::collections::BTreeSet<String> = old_categories.iter().map(|c| c.id.clone()).collect();

            for edge in &existing_edges {
                if !new_ids.contains(&edge.category_id) {
                    ctx.shared.repos.category_items.delete(&edge.id, &ctx.scope).await?;
                }
            }
            for category in &new_categories {
                if !old_ids.contains(&category.id) {
                    let edge = CategoryItem::new(item_id.clone(), category.id.clone(), ctx.scope.clone());
                    ctx.shared.repos.category_items.create(edge).await?;
                }
            }

            touched_categories = old_categories.into_iter().chain(new_categories).collect();
        }

        item.touch();
        let updated = ctx.shared.repos.items.update(item).await?;

        let profile_name = cfg_str(&self.spec, "category_update_llm_profile", "default");
        let category_updates = resummarize_all(ctx, touched_categories, profile_name).await;

        let response = ItemMutationResponse { memory_item: updated, category_updates };
        state.set_typed("response", &response);
        Ok(())
    }
}
