//! Step 1: fetch `resource_url` into the blob directory and create the
//! `Resource` row (spec §4.2).

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::MemoryError;
use crate::model::{Modality, Resource};
use crate::service::ServiceContext;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

pub struct IngestResource {
    spec: StepSpec,
}

impl IngestResource {
    pub fn new() -> Self {
        Self {
            spec: StepSpec::new("ingest_resource")
                .requires(["resource_url", "modality"])
                .produces(["resource"])
                .capability(Capability::Io),
        }
    }
}

impl Default for IngestResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step<ServiceContext> for IngestResource {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let resource_url: String = state
            .get_typed("resource_url")
            .ok_or_else(|| MemoryError::invalid_input("resource_url is required"))?;
        let modality_raw: String = state
            .get_typed("modality")
            .ok_or_else(|| MemoryError::invalid_input("modality is required"))?;
        let modality = Modality::from_str(&modality_raw).map_err(MemoryError::invalid_input)?;

        let mut resource = Resource::new(resource_url.clone(), modality, ctx.scope.clone());

        let local_path = ctx
            .shared
            .fetcher
            .fetch(&resource_url, &ctx.shared.config.blob_config.resources_dir, &resource.id)
            .await?;
        resource.local_path = Some(local_path);

        let created = ctx.shared.repos.resources.create(resource).await?;
        tracing::debug!(resource_id = created.id.as_str(), "ingested resource");
        state.set_typed("resource", &created);
        Ok(())
    }
}
