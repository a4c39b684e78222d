//! `list_memory_items(where)`: filter-only read, no scoring (spec §4.4).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::scope::ScopeValue;
use crate::service::ServiceContext;
use crate::storage::WhereFilter;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

pub struct ListMemoryItems {
    spec: StepSpec,
}

impl ListMemoryItems {
    pub fn new() -> Self {
        Self {
            spec: StepSpec::new("list_memory_items").requires(["where_raw"]).produces(["items"]).capability(Capability::Db),
        }
    }
}

impl Default for ListMemoryItems {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step<ServiceContext> for ListMemoryItems {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;
        let where_raw: BTreeMap<String, ScopeValue> = state.get_typed("where_raw").unwrap_or_default();
        let where_in: BTreeMap<String, Vec<ScopeValue>> = state.get_typed("where_in").unwrap_or_default();
        let filter = WhereFilter::parse(&where_raw, &where_in, &ctx.shared.config.scope_model()).map_err(MemoryError::from)?;
        let items = ctx.shared.repos.items.list(&filter).await?;
        state.set_typed("items", &items);
        Ok(())
    }
}
