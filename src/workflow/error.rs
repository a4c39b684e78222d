//! Workflow-level errors: pipeline validation failures and run outcomes.

use thiserror::Error;

use crate::error::MemoryError;

/// Returned by [`super::PipelineManager`] mutations (spec §4.1). A mutation
/// that fails validation is rejected atomically: the pipeline's revision is
/// unchanged.
#[derive(Debug, Error, Clone)]
pub enum PipelineError {
    #[error("pipeline not found: {0}")]
    NotFound(String),

    #[error("step not found: {0} in pipeline {1}")]
    StepNotFound(String, String),

    #[error("duplicate step id: {0}")]
    DuplicateStep(String),

    #[error("step {step_id} requires {missing:?} which is not produced by any earlier step or initial input")]
    UnsatisfiedRequirement {
        step_id: String,
        missing: Vec<String>,
    },
}

impl From<PipelineError> for MemoryError {
    fn from(e: PipelineError) -> Self {
        MemoryError::pipeline_invalid(e.to_string())
    }
}

/// Terminal outcome of a [`super::Runner`] run: carries the state as far as it
/// got plus the id of the last step that completed successfully, so callers
/// can resume from a deterministic checkpoint (spec §5).
#[derive(Debug, Error, Clone)]
#[error("step {step_id} failed: {source}")]
pub struct RunError {
    pub step_id: String,
    pub last_completed_step: Option<String>,
    pub source: MemoryError,
}
