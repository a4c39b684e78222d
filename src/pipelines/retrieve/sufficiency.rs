//! Steps C/E: after a recall section fills, ask whether the accumulated
//! context already answers the query; if so, skip the remaining sections
//! and build the response now (spec §4.3).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::llm::{CallOptions, ChatMessage};
use crate::pipelines::support::{cfg_bool, cfg_str};
use crate::service::ServiceContext;
use crate::workflow::{Capability, ConfigValue, PipelineState, Step, StepContext, StepSpec};

use super::build::assemble;
use super::types::{ScoredCategory, ScoredItem, ScoredResource};

pub struct SufficiencyCheck {
    spec: StepSpec,
}

impl SufficiencyCheck {
    pub fn new(step_id: &str, enabled: bool, prompt: &str, llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new(step_id)
                .requires(["rewritten_query"])
                .produces(["response"])
                .capability(Capability::Llm)
                .config("enabled", ConfigValue::Bool(enabled))
                .config("prompt", prompt)
                .config("llm_profile", llm_profile),
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for SufficiencyCheck {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;
        if state.is_halted() || !cfg_bool(&self.spec, "enabled", false) {
            return Ok(());
        }

        let rewritten_query: String = state.get_typed("rewritten_query").unwrap_or_default();
        let categories: Vec<ScoredCategory> = state.get_typed("categories").unwrap_or_default();
        let items: Vec<ScoredItem> = state.get_typed("items").unwrap_or_default();
        let resources: Vec<ScoredResource> = state.get_typed("resources").unwrap_or_default();
        if categories.is_empty() && items.is_empty() && resources.is_empty() {
            return Ok(());
        }

        let context = format_context(&categories, &items, &resources);
        let prompt = cfg_str(&self.spec, "prompt", "Is the context above sufficient to answer the query? Reply yes or no.");
        let profile_name = cfg_str(&self.spec, "llm_profile", "default");
        let client = ctx.shared.llm.resolve(profile_name).map_err(MemoryError::from)?;

        let messages = [
            ChatMessage::system(prompt),
            ChatMessage::user(format!("Query: {rewritten_query}\n\nContext:\n{context}")),
        ];
        let (raw, _usage) = client.chat(&messages, &CallOptions::default()).await.map_err(MemoryError::from)?;

        if raw.to_ascii_lowercase().contains("yes") {
            let response = assemble(state);
            state.set_typed("response", &response);
            state.halt("sufficiency check satisfied");
        }
        Ok(())
    }
}

fn format_context(categories: &[ScoredCategory], items: &[ScoredItem], resources: &[ScoredResource]) -> String {
    let mut lines = Vec::new();
    for c in categories {
        lines.push(format!("category: {} - {}", c.category.name, c.category.summary.clone().unwrap_or_default()));
    }
    for i in items {
        lines.push(format!("item[{}]: {}", i.item.memory_type, i.item.summary));
    }
    for r in resources {
        lines.push(format!("resource: {}", r.resource.caption.clone().unwrap_or_else(|| r.resource.url.clone())));
    }
    lines.join("\n")
}
