//! Workflow engine: named, revisioned pipelines of steps (spec §4.1).
//!
//! Grounded on the teacher's `graph::StateGraph` / `Node` / `CompiledStateGraph`
//! machinery, generalized so a step declares `requires`/`produces` against a
//! dynamic string-keyed state map instead of a statically typed state `S` —
//! the workflow engine here is domain-agnostic; `crate::pipelines` supplies
//! the concrete memorize/retrieve/CRUD steps.

mod cancellation;
mod error;
mod interceptor;
mod manager;
mod pipeline;
mod state;
mod step;

pub use cancellation::CancellationToken;
pub use error::{PipelineError, RunError};
pub use interceptor::{NoopInterceptor, PipelineInterceptor};
pub use manager::PipelineManager;
pub use pipeline::Pipeline;
pub use state::{HaltReason, PipelineState};
pub use step::{Capability, ConfigValue, Step, StepContext, StepSpec};

mod runner;
pub use runner::{Retry, Runner};
