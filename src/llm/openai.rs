//! SDK-backed client: wraps `async-openai` to implement [`LlmClient`] for a
//! profile with `client_backend: sdk`. Grounded on the teacher's
//! `ChatOpenAI` (chat) and `OpenAIEmbedder` (embeddings).

use async_openai::{
    config::OpenAIConfig,
    types::audio::CreateTranscriptionRequestArgs,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    types::embeddings::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use super::{CallOptions, ChatMessage, LlmClient, LlmError, LlmUsage};

/// OpenAI (or OpenAI-compatible) client built from a resolved [`super::Profile`].
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    chat_model: Option<String>,
    embed_model: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: OpenAIConfig, chat_model: Option<String>, embed_model: Option<String>) -> Self {
        Self { client: Client::with_config(config), chat_model, embed_model }
    }

    fn request_messages(messages: &[ChatMessage]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| {
                if m.role == "system" {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                        m.content.as_str(),
                    ))
                } else {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(m.content.as_str()))
                }
            })
            .collect()
    }

    async fn chat_model_required(&self) -> Result<&str, LlmError> {
        self.chat_model
            .as_deref()
            .ok_or_else(|| LlmError::RequestFailed("profile has no chat_model configured".to_string()))
    }

    async fn run_chat(&self, messages: Vec<ChatCompletionRequestMessage>, options: &CallOptions) -> Result<(String, LlmUsage), LlmError> {
        let model = self.chat_model_required().await?;
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model.to_string());
        args.messages(messages);
        if let Some(t) = options.temperature {
            args.temperature(t);
        }
        if let Some(max_tokens) = options.max_tokens {
            args.max_tokens(max_tokens);
        }
        let request = args
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("request build failed: {e}")))?;

        debug!(model, "openai chat create");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::RequestFailed(format!("openai API error: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let usage = response
            .usage
            .map(|u| LlmUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();
        Ok((content, usage))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage], options: &CallOptions) -> Result<(String, LlmUsage), LlmError> {
        self.run_chat(Self::request_messages(messages), options).await
    }

    async fn summarize(
        &self,
        text: &str,
        system_prompt: &str,
        options: &CallOptions,
    ) -> Result<(String, LlmUsage), LlmError> {
        let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(text)];
        self.run_chat(Self::request_messages(&messages), options).await
    }

    async fn vision(
        &self,
        prompt: &str,
        image_refs: &[String],
        options: &CallOptions,
    ) -> Result<(String, LlmUsage), LlmError> {
        // Our ChatMessage is text-only; image references are inlined as a
        // textual manifest so non-multimodal profiles still get *something*
        // useful to work with. Real multimodal profiles can override this.
        let manifest = image_refs.join(", ");
        let combined = format!("{prompt}\n\nImages: {manifest}");
        let messages = vec![ChatMessage::user(combined)];
        self.run_chat(Self::request_messages(&messages), options).await
    }

    async fn embed(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, LlmUsage), LlmError> {
        let model = self
            .embed_model
            .clone()
            .ok_or_else(|| LlmError::NoEmbedModel("profile has no embed_model configured".to_string()))?;

        let input = if texts.len() == 1 {
            EmbeddingInput::String(texts[0].clone())
        } else {
            EmbeddingInput::StringArray(texts.to_vec())
        };
        let request = CreateEmbeddingRequest { input, model, ..Default::default() };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| LlmError::RequestFailed(format!("openai API error: {e}")))?;

        let usage = LlmUsage {
            prompt_tokens: response.usage.prompt_tokens,
            completion_tokens: 0,
            total_tokens: response.usage.total_tokens,
        };
        Ok((response.data.into_iter().map(|e| e.embedding).collect(), usage))
    }

    async fn transcribe(&self, audio_ref: &str) -> Result<(String, LlmUsage), LlmError> {
        let model = self.chat_model_required().await.unwrap_or("whisper-1");
        let request = CreateTranscriptionRequestArgs::default()
            .file(audio_ref)
            .model(model)
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("request build failed: {e}")))?;

        debug!(audio_ref, "openai audio transcription create");
        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| LlmError::RequestFailed(format!("openai API error: {e}")))?;

        Ok((response.text, LlmUsage::default()))
    }
}
