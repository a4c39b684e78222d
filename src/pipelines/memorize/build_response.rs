//! Step 7: assemble the memorize pipeline's final `{resource, items,
//! categories, relations}` response (spec §4.2).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::model::{CategoryItem, MemoryCategory, MemoryItem, Resource};
use crate::service::ServiceContext;
use crate::workflow::{PipelineState, Step, StepContext, StepSpec};

use super::types::MemorizeResponse;

pub struct BuildResponse {
    spec: StepSpec,
}

impl BuildResponse {
    pub fn new() -> Self {
        Self {
            spec: StepSpec::new("build_response")
                .requires(["resource", "items", "categories", "relations"])
                .produces(["response"]),
        }
    }
}

impl Default for BuildResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step<ServiceContext> for BuildResponse {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let resource: Resource = state
            .get_typed("resource")
            .ok_or_else(|| MemoryError::invalid_input("resource is required"))?;
        let items: Vec<MemoryItem> = state.get_typed("items").unwrap_or_default();
        let categories: Vec<MemoryCategory> = state.get_typed("categories").unwrap_or_default();
        let relations: Vec<CategoryItem> = state.get_typed("relations").unwrap_or_default();

        let response = MemorizeResponse { resource, items, categories, relations };
        state.set_typed("response", &response);
        Ok(())
    }
}
