//! memoria-core: a memory service for AI agents (spec §1).
//!
//! Layout mirrors the teacher's workspace: `scope`/`model`/`error` are the
//! data-model primitives, `storage` is the multi-backend repository
//! abstraction, `llm` is the profile-routed client, `workflow` is the
//! generic pipeline engine, and `pipelines`/`config`/`fetcher`/`service` wire
//! them together into the public `MemoryService` façade.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod llm;
pub mod model;
pub mod pipelines;
pub mod scope;
pub mod service;
pub mod storage;
pub mod workflow;

pub use error::{ErrorKind, MemoryError};
pub use scope::{Scope, ScopeModel, ScopeValue};
pub use service::MemoryService;
