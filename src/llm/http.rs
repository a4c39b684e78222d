//! HTTP-backed client: raw `reqwest` calls against an OpenAI-compatible
//! endpoint, for profiles with `client_backend: http` (providers the SDK
//! doesn't model, or deployments that want to avoid it entirely).

use async_trait::async_trait;
use serde_json::json;

use super::{CallOptions, ChatMessage, LlmClient, LlmError, LlmUsage};

pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    chat_model: Option<String>,
    embed_model: Option<String>,
    chat_path: String,
    embed_path: String,
    transcribe_path: String,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        chat_model: Option<String>,
        embed_model: Option<String>,
        endpoint_overrides: &std::collections::HashMap<String, String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            chat_model,
            embed_model,
            chat_path: endpoint_overrides
                .get("chat")
                .cloned()
                .unwrap_or_else(|| "/v1/chat/completions".to_string()),
            embed_path: endpoint_overrides
                .get("embed")
                .cloned()
                .unwrap_or_else(|| "/v1/embeddings".to_string()),
            transcribe_path: endpoint_overrides
                .get("transcribe")
                .cloned()
                .unwrap_or_else(|| "/v1/audio/transcriptions".to_string()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl LlmClient for HttpClient {
    async fn chat(&self, messages: &[ChatMessage], options: &CallOptions) -> Result<(String, LlmUsage), LlmError> {
        let model = self
            .chat_model
            .as_deref()
            .ok_or_else(|| LlmError::RequestFailed("profile has no chat_model configured".to_string()))?;

        let mut body = json!({
            "model": model,
            "messages": messages.iter().map(|m| json!({"role": m.role, "content": m.content})).collect::<Vec<_>>(),
        });
        if let Some(t) = options.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let response = self
            .authed(self.http.post(self.url(&self.chat_path)).json(&body))
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?
            .json::<serde_json::Value>()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let usage = LlmUsage {
            prompt_tokens: response["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: response["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: response["usage"]["total_tokens"].as_u64().unwrap_or(0) as u32,
        };
        Ok((content, usage))
    }

    async fn summarize(
        &self,
        text: &str,
        system_prompt: &str,
        options: &CallOptions,
    ) -> Result<(String, LlmUsage), LlmError> {
        let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(text)];
        self.chat(&messages, options).await
    }

    async fn vision(
        &self,
        prompt: &str,
        image_refs: &[String],
        options: &CallOptions,
    ) -> Result<(String, LlmUsage), LlmError> {
        let manifest = image_refs.join(", ");
        let messages = vec![ChatMessage::user(format!("{prompt}\n\nImages: {manifest}"))];
        self.chat(&messages, options).await
    }

    async fn embed(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, LlmUsage), LlmError> {
        let model = self
            .embed_model
            .as_deref()
            .ok_or_else(|| LlmError::NoEmbedModel("profile has no embed_model configured".to_string()))?;

        let body = json!({ "model": model, "input": texts });
        let response = self
            .authed(self.http.post(self.url(&self.embed_path)).json(&body))
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?
            .json::<serde_json::Value>()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let vectors: Vec<Vec<f32>> = response["data"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item["embedding"].as_array())
                    .map(|values| values.iter().filter_map(|v| v.as_f64()).map(|v| v as f32).collect())
                    .collect()
            })
            .unwrap_or_default();

        let usage = LlmUsage {
            prompt_tokens: response["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: 0,
            total_tokens: response["usage"]["total_tokens"].as_u64().unwrap_or(0) as u32,
        };
        Ok((vectors, usage))
    }

    async fn transcribe(&self, audio_ref: &str) -> Result<(String, LlmUsage), LlmError> {
        let model = self.chat_model.as_deref().unwrap_or("whisper-1");
        let bytes = tokio::fs::read(audio_ref)
            .await
            .map_err(|e| LlmError::RequestFailed(format!("could not read audio file {audio_ref}: {e}")))?;
        let filename = std::path::Path::new(audio_ref)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        let form = reqwest::multipart::Form::new()
            .text("model", model.to_string())
            .part("file", part);

        let response = self
            .authed(self.http.post(self.url(&self.transcribe_path)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?
            .json::<serde_json::Value>()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let text = response["text"].as_str().unwrap_or_default().to_string();
        Ok((text, LlmUsage::default()))
    }
}
