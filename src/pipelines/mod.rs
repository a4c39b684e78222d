//! Built-in pipelines: `memorize`, `retrieve_rag`/`retrieve_llm`, and the
//! CRUD patch/list pipelines (spec §4.1 "the pipeline manager holds named
//! pipelines").

pub mod crud;
pub mod memorize;
pub mod retrieve;

pub(crate) mod support;

use crate::config::MemoryConfig;
use crate::service::ServiceContext;
use crate::workflow::{PipelineError, PipelineManager};

/// Registers every built-in pipeline against a fresh manager. Called once
/// from [`crate::service::MemoryService::new`].
pub fn register_all(manager: &PipelineManager<ServiceContext>, config: &MemoryConfig) -> Result<(), PipelineError> {
    memorize::register(manager, config)?;
    retrieve::register(manager, config)?;
    crud::register(manager, config)?;
    Ok(())
}
