//! Interceptors: `before`/`after`/`on_error` hooks around each step (spec §4.1).
//!
//! Grounded on the teacher's `NodeMiddleware` "around" pattern, split into
//! three narrower hooks (rather than one function wrapping the inner call)
//! since the spec calls out `before`/`after`/`on_error` as distinct,
//! independently registrable extension points.

use async_trait::async_trait;

use crate::error::MemoryError;

use super::state::PipelineState;

#[async_trait]
pub trait PipelineInterceptor<C: Send + Sync>: Send + Sync {
    async fn before(&self, _step_id: &str, _state: &PipelineState) {}

    async fn after(&self, _step_id: &str, _state: &PipelineState) {}

    async fn on_error(&self, _step_id: &str, _error: &MemoryError) {}
}

/// No-op interceptor; the default when a caller registers none.
pub struct NoopInterceptor;

#[async_trait]
impl<C: Send + Sync> PipelineInterceptor<C> for NoopInterceptor {}
