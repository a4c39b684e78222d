//! `delete_memory_item`: delete edges, delete the item, resummarize the
//! categories that lost it (spec §4.4).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::pipelines::support::cfg_str;
use crate::service::ServiceContext;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

use super::support::resummarize_all;

pub struct DeleteMemoryItem {
    spec: StepSpec,
}

impl DeleteMemoryItem {
    pub fn new(category_update_llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new("delete_memory_item")
                .requires(["item_id"])
                .produces(["response"])
                .capability(Capability::Db)
                .config("category_update_llm_profile", category_update_llm_profile),
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for DeleteMemoryItem {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let item_id: String = state.get_typed("item_id").ok_or_else(|| MemoryError::invalid_input("item_id is required"))?;

        let removed_edges = ctx.shared.repos.category_items.delete_by_item(&item_id, &ctx.scope).await?;
        let mut categories = Vec::with_capacity(removed_edges.len());
        for edge in &removed_edges {
            if let Some(category) = ctx.shared.repos.categories.get_by_id(&edge.category_id, &ctx.scope).await? {
                categories.push(category);
            }
        }

        ctx.shared.repos.items.delete(&item_id, &ctx.scope).await?;

        let profile_name = cfg_str(&self.spec, "category_update_llm_profile", "default");
        let category_updates = resummarize_all(ctx, categories, profile_name).await;
        state.set_typed("response", &category_updates);
        Ok(())
    }
}
