//! Step 4: named extension point, pass-through by default (spec §4.2, §9:
//! "consolidation policy is deferred"). Operators wire similarity-based
//! dedup against existing items in scope via `replace_step`.

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::service::ServiceContext;
use crate::workflow::{PipelineState, Step, StepContext, StepSpec};

use super::types::CandidateItem;

pub struct DedupeMerge {
    spec: StepSpec,
}

impl DedupeMerge {
    pub fn new() -> Self {
        Self {
            spec: StepSpec::new("dedupe_merge")
                .requires(["candidate_items"])
                .produces(["items_to_persist"]),
        }
    }
}

impl Default for DedupeMerge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step<ServiceContext> for DedupeMerge {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;
        let candidates: Vec<CandidateItem> = state.get_typed("candidate_items").unwrap_or_default();
        state.set_typed("items_to_persist", &candidates);
        Ok(())
    }
}
