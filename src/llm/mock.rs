//! Fixed-response LLM client for tests.

use async_trait::async_trait;

use super::{CallOptions, ChatMessage, LlmClient, LlmError, LlmUsage};

/// Mock LLM: fixed chat/summarize/vision text and a deterministic
/// embedding (hashes each text into a vector of the configured dimension).
/// Used in place of [`super::OpenAiClient`] throughout the pipeline tests.
pub struct MockLlm {
    content: String,
    embed_dimension: usize,
}

impl MockLlm {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), embed_dimension: 8 }
    }

    pub fn with_embed_dimension(mut self, dimension: usize) -> Self {
        self.embed_dimension = dimension;
        self
    }

    /// Deterministic pseudo-embedding: stable across calls for the same
    /// text, distinct across different texts, no external dependency.
    fn fake_embedding(&self, text: &str) -> Vec<f32> {
        let mut seed: u64 = 1469598103934665603;
        for byte in text.bytes() {
            seed ^= byte as u64;
            seed = seed.wrapping_mul(1099511628211);
        }
        (0..self.embed_dimension)
            .map(|i| {
                let v = seed.wrapping_add(i as u64).wrapping_mul(2654435761);
                ((v % 2000) as f32 / 1000.0) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn chat(&self, _messages: &[ChatMessage], _options: &CallOptions) -> Result<(String, LlmUsage), LlmError> {
        Ok((self.content.clone(), LlmUsage::default()))
    }

    async fn summarize(
        &self,
        _text: &str,
        _system_prompt: &str,
        _options: &CallOptions,
    ) -> Result<(String, LlmUsage), LlmError> {
        Ok((self.content.clone(), LlmUsage::default()))
    }

    async fn vision(
        &self,
        _prompt: &str,
        _image_refs: &[String],
        _options: &CallOptions,
    ) -> Result<(String, LlmUsage), LlmError> {
        Ok((self.content.clone(), LlmUsage::default()))
    }

    async fn embed(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, LlmUsage), LlmError> {
        Ok((texts.iter().map(|t| self.fake_embedding(t)).collect(), LlmUsage::default()))
    }

    async fn transcribe(&self, _audio_ref: &str) -> Result<(String, LlmUsage), LlmError> {
        Ok((self.content.clone(), LlmUsage::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_embedding_is_deterministic_and_dimension_matches() {
        let llm = MockLlm::new("hi").with_embed_dimension(4);
        let (vectors, _) = llm.embed(&["a".to_string(), "a".to_string(), "b".to_string()]).await.unwrap();
        assert_eq!(vectors[0].len(), 4);
        assert_eq!(vectors[0], vectors[1]);
        assert_ne!(vectors[0], vectors[2]);
    }

    #[tokio::test]
    async fn chat_returns_fixed_content() {
        let llm = MockLlm::new("hello there");
        let (text, _) = llm.chat(&[ChatMessage::user("hi")], &CallOptions::default()).await.unwrap();
        assert_eq!(text, "hello there");
    }
}
