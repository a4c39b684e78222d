//! Crate-wide error type.
//!
//! `MemoryError` is the wire-visible error (spec §6/§7): a stable `kind`,
//! a human message, and optional structured `details`. Subsystem errors
//! (`workflow::PipelineError`, `storage::StorageError`, `llm::LlmError`)
//! convert into it at the boundary, mirroring how the teacher layers
//! `CompilationError` / `StoreError` / `AgentError`.

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Stable error kind names; part of the external surface (spec §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    InvalidQuery,
    InvalidFilter,
    UnknownProfile,
    FetchFailed,
    ExtractionFailed,
    SummarizationFailed,
    PipelineInvalid,
    BackendUnavailable,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::InvalidQuery => "InvalidQuery",
            ErrorKind::InvalidFilter => "InvalidFilter",
            ErrorKind::UnknownProfile => "UnknownProfile",
            ErrorKind::FetchFailed => "FetchFailed",
            ErrorKind::ExtractionFailed => "ExtractionFailed",
            ErrorKind::SummarizationFailed => "SummarizationFailed",
            ErrorKind::PipelineInvalid => "PipelineInvalid",
            ErrorKind::BackendUnavailable => "BackendUnavailable",
            ErrorKind::Cancelled => "Cancelled",
        }
    }

    /// Upstream failures are retried with backoff (spec §7); the others are
    /// rejected immediately with no side effects.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::FetchFailed
                | ErrorKind::ExtractionFailed
                | ErrorKind::SummarizationFailed
                | ErrorKind::BackendUnavailable
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tagged error value returned by every public `MemoryService` operation.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct MemoryError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<JsonValue>,
}

impl MemoryError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidQuery, message)
    }

    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFilter, message)
    }

    pub fn unknown_profile(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorKind::UnknownProfile, format!("unknown profile: {name}"))
    }

    pub fn pipeline_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PipelineInvalid, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "operation cancelled")
    }

    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendUnavailable, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = MemoryError::invalid_input("missing content");
        let s = err.to_string();
        assert!(s.contains("InvalidInput"));
        assert!(s.contains("missing content"));
    }

    #[test]
    fn retryable_kinds_match_spec_upstream_failures() {
        assert!(ErrorKind::FetchFailed.is_retryable());
        assert!(ErrorKind::ExtractionFailed.is_retryable());
        assert!(ErrorKind::SummarizationFailed.is_retryable());
        assert!(ErrorKind::BackendUnavailable.is_retryable());
        assert!(!ErrorKind::InvalidInput.is_retryable());
        assert!(!ErrorKind::PipelineInvalid.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
    }
}
