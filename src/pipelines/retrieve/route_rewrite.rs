//! Step A: decide `needs_retrieval`, then condense the conversation into one
//! `rewritten_query` (+ optional `next_step_query` hint) (spec §4.3).

use async_trait::async_trait;

use crate::error::{ErrorKind, MemoryError};
use crate::llm::{CallOptions, ChatMessage};
use crate::pipelines::support::{cfg_bool, cfg_str};
use crate::service::ServiceContext;
use crate::workflow::{Capability, ConfigValue, PipelineState, Step, StepContext, StepSpec};

use super::build::assemble;
use super::types::Query;

pub struct RouteRewrite {
    spec: StepSpec,
}

impl RouteRewrite {
    pub fn new(route_intention: bool, llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new("route_rewrite")
                .requires(["queries"])
                .produces(["needs_retrieval", "original_query", "rewritten_query", "next_step_query", "response"])
                .capability(Capability::Llm)
                .config("route_intention", ConfigValue::Bool(route_intention))
                .config("llm_profile", llm_profile),
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for RouteRewrite {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let queries: Vec<Query> = state
            .get_typed("queries")
            .ok_or_else(|| MemoryError::new(ErrorKind::InvalidQuery, "queries is required"))?;
        if queries.is_empty() {
            return Err(MemoryError::new(ErrorKind::InvalidQuery, "queries must not be empty"));
        }
        let original_query = queries.last().map(|q| q.content.text.clone()).unwrap_or_default();
        state.set_typed("original_query", &original_query);

        let route_intention = cfg_bool(&self.spec, "route_intention", true);
        let profile_name = cfg_str(&self.spec, "llm_profile", "default");
        let client = ctx.shared.llm.resolve(profile_name).map_err(MemoryError::from)?;

        let needs_retrieval = if route_intention {
            let transcript = format_transcript(&queries);
            let system = "Decide whether answering the final message requires recalling stored memories. \
                          Reply with exactly one word: yes or no.";
            let messages = [ChatMessage::system(system), ChatMessage::user(transcript)];
            let (raw, _usage) = client.chat(&messages, &CallOptions::default()).await.map_err(MemoryError::from)?;
            raw.to_ascii_lowercase().contains("yes")
        } else {
            true
        };
        state.set_typed("needs_retrieval", &needs_retrieval);

        if !needs_retrieval {
            state.set_typed("rewritten_query", &original_query);
            state.set_typed("next_step_query", &Option::<String>::None);
            let response = assemble(state);
            state.set_typed("response", &response);
            state.halt("needs_retrieval is false");
            return Ok(());
        }

        let transcript = format_transcript(&queries);
        let system = "Condense this conversation into a single self-contained search query. \
                      Reply with the query text only, no preamble.";
        let messages = [ChatMessage::system(system), ChatMessage::user(transcript)];
        let (rewritten, _usage) = client.chat(&messages, &CallOptions::default()).await.map_err(MemoryError::from)?;
        let rewritten_query = rewritten.trim().to_string();
        state.set_typed("rewritten_query", &rewritten_query);
        state.set_typed("next_step_query", &Option::<String>::None);

        Ok(())
    }
}

fn format_transcript(queries: &[Query]) -> String {
    queries
        .iter()
        .map(|q| format!("{}: {}", q.role, q.content.text))
        .collect::<Vec<_>>()
        .join("\n")
}
