//! Step 3: prompt the chat LLM once per configured memory type for
//! structured `{summary, category_hints[]}` candidates (spec §4.2).
//!
//! A type whose output doesn't parse is logged and skipped; the remaining
//! types still proceed (spec: "Non-parseable LLM output for one type is
//! logged and that type is skipped; other types proceed").

use async_trait::async_trait;

use crate::error::{ErrorKind, MemoryError};
use crate::llm::{CallOptions, ChatMessage};
use crate::model::Resource;
use crate::pipelines::support::cfg_str;
use crate::service::ServiceContext;
use crate::workflow::{Capability, PipelineState, Step, StepContext, StepSpec};

use super::types::CandidateItem;

pub struct ExtractItems {
    spec: StepSpec,
    memory_types: Vec<String>,
}

impl ExtractItems {
    pub fn new(memory_extract_llm_profile: &str, memory_types: Vec<String>) -> Self {
        Self {
            spec: StepSpec::new("extract_items")
                .requires(["resource"])
                .produces(["candidate_items"])
                .capability(Capability::Llm)
                .config("llm_profile", memory_extract_llm_profile),
            memory_types,
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for ExtractItems {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let resource: Resource = state
            .get_typed("resource")
            .ok_or_else(|| MemoryError::invalid_input("resource is required"))?;
        let source_text = resource.caption.clone().unwrap_or_else(|| resource.url.clone());

        let profile_name = cfg_str(&self.spec, "llm_profile", "default");
        let client = ctx.shared.llm.resolve(profile_name).map_err(MemoryError::from)?;

        let mut candidates = Vec::new();
        for memory_type in &self.memory_types {
            ctx.check_cancelled()?;
            let prompt = ctx
                .shared
                .config
                .memorize_config
                .memory_type_prompts
                .get(memory_type)
                .cloned()
                .unwrap_or_else(|| default_type_prompt(memory_type));

            let messages = [ChatMessage::system(prompt), ChatMessage::user(source_text.clone())];
            let (raw, _usage) = client
                .chat(&messages, &CallOptions::default())
                .await
                .map_err(|e| MemoryError::new(ErrorKind::ExtractionFailed, e.to_string()))?;

            match parse_candidates(&raw, memory_type) {
                Ok(mut parsed) => candidates.append(&mut parsed),
                Err(error) => {
                    tracing::warn!(memory_type = memory_type.as_str(), %error, "unparseable extraction output, skipping type");
                }
            }
        }

        state.set_typed("candidate_items", &candidates);
        Ok(())
    }
}

fn default_type_prompt(memory_type: &str) -> String {
    format!(
        "Extract zero or more {memory_type} memories from the text below. \
         Reply with a JSON array of objects: [{{\"summary\": string, \"category_hints\": [string]}}]."
    )
}

#[derive(serde::Deserialize)]
struct RawCandidate {
    summary: String,
    #[serde(default)]
    category_hints: Vec<String>,
}

fn parse_candidates(raw: &str, memory_type: &str) -> Result<Vec<CandidateItem>, serde_json::Error> {
    let json_slice = extract_json_array(raw).unwrap_or(raw);
    let parsed: Vec<RawCandidate> = serde_json::from_str(json_slice)?;
    Ok(parsed
        .into_iter()
        .map(|c| CandidateItem {
            memory_type: memory_type.to_string(),
            summary: c.summary,
            category_hints: c.category_hints,
        })
        .collect())
}

/// LLM output is often fenced (```json ... ```) or preceded by prose;
/// extract the first balanced `[...]` span before parsing.
fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_array() {
        let raw = "```json\n[{\"summary\": \"likes hiking\", \"category_hints\": [\"activities\"]}]\n```";
        let candidates = parse_candidates(raw, "profile").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].summary, "likes hiking");
        assert_eq!(candidates[0].memory_type, "profile");
    }

    #[test]
    fn non_json_output_fails_to_parse() {
        assert!(parse_candidates("not json", "profile").is_err());
    }
}
