//! LLM client errors.

use thiserror::Error;

use crate::error::{ErrorKind, MemoryError};

#[derive(Debug, Error, Clone)]
pub enum LlmError {
    #[error("unknown llm profile: {0}")]
    UnknownProfile(String),

    #[error("llm backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("llm request failed: {0}")]
    RequestFailed(String),

    #[error("profile has no embedding model configured: {0}")]
    NoEmbedModel(String),
}

impl From<LlmError> for MemoryError {
    fn from(e: LlmError) -> Self {
        let kind = match &e {
            LlmError::UnknownProfile(_) | LlmError::NoEmbedModel(_) => ErrorKind::UnknownProfile,
            LlmError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            LlmError::RequestFailed(_) => ErrorKind::SummarizationFailed,
        };
        MemoryError::new(kind, e.to_string())
    }
}
