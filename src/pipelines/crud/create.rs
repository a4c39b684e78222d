//! `create_memory_item`: validate type, embed content, create the item,
//! resolve/create its categories, wire edges, resummarize (spec §4.4).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::model::{CategoryItem, MemoryItem};
use crate::pipelines::support::cfg_str;
use crate::service::ServiceContext;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

use super::support::{get_or_create_category, resummarize_all};
use super::types::ItemMutationResponse;

pub struct CreateMemoryItem {
    spec: StepSpec,
    memory_types: Vec<String>,
}

impl CreateMemoryItem {
    pub fn new(memory_types: Vec<String>, embed_llm_profile: &str, category_update_llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new("create_memory_item")
                .requires(["memory_type", "content", "category_names"])
                .produces(["response"])
                .capability(Capability::Llm)
                .capability(Capability::Db)
                .config("embed_llm_profile", embed_llm_profile)
                .config("category_update_llm_profile", category_update_llm_profile),
            memory_types,
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for CreateMemoryItem {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let memory_type: String = state
            .get_typed("memory_type")
            .ok_or_else(|| MemoryError::invalid_input("memory_type is required"))?;
        let content: String = state.get_typed("content").ok_or_else(|| MemoryError::invalid_input("content is required"))?;
        let category_names: Vec<String> = state.get_typed("category_names").unwrap_or_default();

        if !self.memory_types.iter().any(|t| t == &memory_type) {
            return Err(MemoryError::invalid_input(format!("unknown memory_type: {memory_type}")));
        }
        if content.trim().is_empty() {
            return Err(MemoryError::invalid_input("content must not be empty"));
        }

        let embed_profile = cfg_str(&self.spec, "embed_llm_profile", "default");
        let embed_client = ctx.shared.llm.resolve_embed(embed_profile)?;
        let (mut vectors, _usage) = embed_client.embed(&[content.clone()]).await.map_err(MemoryError::from)?;

        let mut item = MemoryItem::new(memory_type, content, ctx.scope.clone());
        item.embedding = vectors.pop();
        let created = ctx.shared.repos.items.create(item).await?;

        let mut categories = Vec::new();
        for name in &category_names {
            let category = get_or_create_category(ctx, name).await?;
            let edge = CategoryItem::new(created.id.clone(), category.id.clone(), ctx.scope.clone());
            ctx.shared.repos.category_items.create(edge).await?;
            categories.push(category);
        }

        let profile_name = cfg_str(&self.spec, "category_update_llm_profile", "default");
        let category_updates = resummarize_all(ctx, categories, profile_name).await;

        let response = ItemMutationResponse { memory_item: created, category_updates };
        state.set_typed("response", &response);
        Ok(())
    }
}
