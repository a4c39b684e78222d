//! Step 6: recompute each affected category's rolling summary (spec §4.2,
//! §7: "if a category summary recompute fails ... the category is marked
//! with `summary=null` so a subsequent call can retry").

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::llm::CallOptions;
use crate::model::{normalize_category_name, MemoryCategory};
use crate::pipelines::support::cfg_str;
use crate::service::ServiceContext;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

pub struct PersistIndex {
    spec: StepSpec,
}

impl PersistIndex {
    pub fn new(category_update_llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new("persist_index")
                .requires(["items", "categories", "relations"])
                .produces(["categories"])
                .capability(Capability::Llm)
                .capability(Capability::Db)
                .config("llm_profile", category_update_llm_profile),
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for PersistIndex {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let categories: Vec<MemoryCategory> = state.get_typed("categories").unwrap_or_default();
        let profile_name = cfg_str(&self.spec, "llm_profile", "default");

        let mut recomputed = Vec::with_capacity(categories.len());
        for category in categories {
            ctx.check_cancelled()?;
            recomputed.push(resummarize(ctx, category, profile_name).await);
        }

        state.set_typed("categories", &recomputed);
        Ok(())
    }
}

/// Recomputes one category's summary; never returns `Err` — on any failure
/// the category is persisted with `summary=None` instead (spec §7).
pub(crate) async fn resummarize(
    ctx: &StepContext<'_, ServiceContext>,
    mut category: MemoryCategory,
    profile_name: &str,
) -> MemoryCategory {
    match try_resummarize(ctx, &category, profile_name).await {
        Ok(summary) => category.summary = summary,
        Err(error) => {
            tracing::warn!(category_id = category.id.as_str(), %error, "category resummarize failed");
            category.summary = None;
        }
    }
    category.touch();
    match ctx.shared.repos.categories.update(category.clone()).await {
        Ok(updated) => updated,
        Err(_) => category,
    }
}

/// Returns `Ok(None)` when the category has no surviving members — an empty
/// category is persisted with `summary=None`, not an empty string.
async fn try_resummarize(
    ctx: &StepContext<'_, ServiceContext>,
    category: &MemoryCategory,
    profile_name: &str,
) -> Result<Option<String>, MemoryError> {
    let edges = ctx.shared.repos.category_items.list_by_category(&category.id, &ctx.scope).await?;
    let mut member_summaries = Vec::with_capacity(edges.len());
    for edge in &edges {
        if let Some(item) = ctx.shared.repos.items.get_by_id(&edge.item_id, &ctx.scope).await? {
            member_summaries.push(item.summary);
        }
    }
    if member_summaries.is_empty() {
        return Ok(None);
    }

    let seed = ctx
        .shared
        .config
        .memorize_config
        .memory_categories
        .iter()
        .find(|s| normalize_category_name(&s.name) == category.normalized_name());
    let prompt = seed
        .and_then(|s| s.summary_prompt.clone())
        .unwrap_or_else(|| ctx.shared.config.memorize_config.default_category_summary_prompt.clone());
    let target_length = seed
        .and_then(|s| s.target_length)
        .unwrap_or(ctx.shared.config.memorize_config.default_category_summary_target_length);

    let client = ctx.shared.llm.resolve(profile_name).map_err(MemoryError::from)?;
    let joined = member_summaries.join("\n- ");
    let (summary, _usage) = client.summarize(&joined, &prompt, &CallOptions::default()).await.map_err(MemoryError::from)?;

    Ok(Some(clip_to_chars(&summary, target_length)))
}

fn clip_to_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
