//! Step 2: branch by modality and produce a `caption` on the resource
//! (spec §4.2).

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::llm::CallOptions;
use crate::model::{Modality, Resource};
use crate::pipelines::support::cfg_str;
use crate::service::ServiceContext;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

pub struct PreprocessMultimodal {
    spec: StepSpec,
}

impl PreprocessMultimodal {
    pub fn new(preprocess_llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new("preprocess_multimodal")
                .requires(["resource"])
                .produces(["resource"])
                .capability(Capability::Llm)
                .capability(Capability::Vision)
                .config("llm_profile", preprocess_llm_profile),
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for PreprocessMultimodal {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let mut resource: Resource = state
            .get_typed("resource")
            .ok_or_else(|| MemoryError::invalid_input("resource is required"))?;

        let profile_name = cfg_str(&self.spec, "llm_profile", "default");
        let client = ctx.shared.llm.resolve(profile_name)?;
        let prompt = ctx
            .shared
            .config
            .memorize_config
            .multimodal_preprocess_prompts
            .get(resource.modality.as_str())
            .cloned()
            .unwrap_or_else(|| default_prompt(resource.modality));

        let local_path = resource.local_path.clone().unwrap_or_else(|| resource.url.clone());
        let caption = match resource.modality {
            Modality::Conversation | Modality::Document => {
                let text = read_text_best_effort(&local_path).await;
                let (summary, _usage) = client.summarize(&text, &prompt, &CallOptions::default()).await?;
                summary
            }
            Modality::Audio => {
                let (transcript, _usage) = client.transcribe(&local_path).await?;
                let (summary, _usage) = client.summarize(&transcript, &prompt, &CallOptions::default()).await?;
                summary
            }
            Modality::Image => {
                let (caption, _usage) = client.vision(&prompt, &[local_path.clone()], &CallOptions::default()).await?;
                caption
            }
            Modality::Video => {
                let frames = representative_frame_refs(&local_path);
                let (caption, _usage) = client.vision(&prompt, &frames, &CallOptions::default()).await?;
                caption
            }
        };

        resource.caption = Some(caption);
        resource.touch();
        let updated = ctx.shared.repos.resources.update(resource).await?;
        state.set_typed("resource", &updated);
        Ok(())
    }
}

fn default_prompt(modality: Modality) -> String {
    format!("Summarize this {} into one short caption.", modality.as_str())
}

/// Best-effort local read: a passthrough URL (never downloaded, spec §4.2
/// "one built-in implementation") has no readable bytes here, so its own
/// url is handed to the LLM as context instead.
async fn read_text_best_effort(path: &str) -> String {
    tokio::fs::read_to_string(path).await.unwrap_or_else(|_| path.to_string())
}

/// Video frame extraction is out of scope for this deployment's built-in
/// fetcher; the whole clip path stands in as a single "frame" reference so
/// the vision call still has something to reason about.
fn representative_frame_refs(local_path: &str) -> Vec<String> {
    vec![local_path.to_string()]
}
