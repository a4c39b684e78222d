//! LLM client abstraction and profile routing (spec §4.6).
//!
//! Grounded on the teacher's `llm::LlmClient` trait: here it carries five
//! operations instead of one (`chat`, `summarize`, `vision`, `embed`,
//! `transcribe`), and two backends implement the same surface — `openai`
//! (the `async-openai` SDK, grounded on the teacher's `ChatOpenAI` /
//! `OpenAIEmbedder`) and `http` (raw `reqwest`, for OpenAI-compatible
//! endpoints the SDK doesn't model).

mod cache;
mod error;
mod http;
mod mock;
mod openai;
mod profile;

pub use cache::ClientCache;
pub use error::LlmError;
pub use mock::MockLlm;
pub use openai::OpenAiClient;
pub use profile::{ClientBackend, Profile, ProfileTable};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Token usage for one LLM call.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One chat message in a `chat`/`vision` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }
}

/// Per-call options shared by `chat`/`summarize`/`vision`: mirrors the
/// handful of knobs steps actually need, not a full provider parameter set.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// LLM client: the five operations every profile-backed step can invoke
/// (spec §4.6). Implementations: [`OpenAiClient`] (SDK or HTTP backend per
/// profile) and [`MockLlm`] (fixed responses, for tests).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], options: &CallOptions) -> Result<(String, LlmUsage), LlmError>;

    async fn summarize(
        &self,
        text: &str,
        system_prompt: &str,
        options: &CallOptions,
    ) -> Result<(String, LlmUsage), LlmError>;

    async fn vision(
        &self,
        prompt: &str,
        image_refs: &[String],
        options: &CallOptions,
    ) -> Result<(String, LlmUsage), LlmError>;

    async fn embed(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, LlmUsage), LlmError>;

    async fn transcribe(&self, audio_ref: &str) -> Result<(String, LlmUsage), LlmError>;
}
