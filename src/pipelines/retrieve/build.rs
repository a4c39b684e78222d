//! Step G: assemble the retrieve pipeline's final response (spec §4.3).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::service::ServiceContext;
use crate::workflow::{PipelineState, Step, StepContext, StepSpec};

use super::types::RetrieveResponse;

pub struct BuildRetrieveResponse {
    spec: StepSpec,
}

impl BuildRetrieveResponse {
    pub fn new() -> Self {
        Self {
            spec: StepSpec::new("build")
                .requires(["needs_retrieval", "original_query", "rewritten_query", "categories", "items", "resources"])
                .produces(["response"]),
        }
    }
}

impl Default for BuildRetrieveResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step<ServiceContext> for BuildRetrieveResponse {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;
        let response = assemble(state);
        state.set_typed("response", &response);
        Ok(())
    }
}

/// Shared by the normal build step and by the early-exit halts in
/// `route_rewrite`/`sufficiency`: reads whatever recall sections made it
/// into state and fills the rest with empty defaults.
pub(crate) fn assemble(state: &PipelineState) -> RetrieveResponse {
    RetrieveResponse {
        needs_retrieval: state.get_typed("needs_retrieval").unwrap_or(false),
        original_query: state.get_typed("original_query").unwrap_or_default(),
        rewritten_query: state.get_typed("rewritten_query").unwrap_or_default(),
        next_step_query: state.get_typed("next_step_query"),
        categories: state.get_typed("categories").unwrap_or_default(),
        items: state.get_typed("items").unwrap_or_default(),
        resources: state.get_typed("resources").unwrap_or_default(),
    }
}
