//! Runner: executes a pipeline's steps sequentially (spec §4.1, §5, §7).

use std::sync::Arc;
use std::time::Duration;

use crate::error::MemoryError;
use crate::scope::Scope;

use super::cancellation::CancellationToken;
use super::error::RunError;
use super::interceptor::{NoopInterceptor, PipelineInterceptor};
use super::pipeline::Pipeline;
use super::state::PipelineState;
use super::step::StepContext;

/// Retry policy for upstream-failure error kinds (spec §7 defaults: N=3,
/// base=250ms, cap=4s, exponential backoff).
#[derive(Clone, Copy, Debug)]
pub struct Retry {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_millis(250),
            cap: Duration::from_secs(4),
        }
    }
}

impl Retry {
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.base.saturating_mul(factor);
        delay.min(self.cap)
    }
}

pub struct Runner<C: Send + Sync> {
    interceptor: Arc<dyn PipelineInterceptor<C>>,
    retry: Retry,
}

impl<C: Send + Sync> Default for Runner<C> {
    fn default() -> Self {
        Self {
            interceptor: Arc::new(NoopInterceptor),
            retry: Retry::default(),
        }
    }
}

impl<C: Send + Sync> Runner<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn PipelineInterceptor<C>>) -> Self {
        self.interceptor = interceptor;
        self
    }

    pub fn with_retry(mut self, retry: Retry) -> Self {
        self.retry = retry;
        self
    }

    /// Runs `pipeline` on `state` to completion, to a `halt`, or to a
    /// terminal error. Steps are always executed in declared order; the
    /// runner never parallelizes steps of the same pipeline (spec §5), though
    /// a step's own handler may fan out concurrent I/O internally.
    pub async fn run(
        &self,
        pipeline: &Pipeline<C>,
        mut state: PipelineState,
        shared: &C,
        scope: Scope,
        cancellation: CancellationToken,
    ) -> Result<PipelineState, RunError> {
        let mut last_completed: Option<String> = None;

        for step in pipeline.steps() {
            let step_id = step.spec().step_id.clone();

            if cancellation.is_cancelled() {
                self.interceptor.on_error(&step_id, &MemoryError::cancelled()).await;
                return Err(RunError {
                    step_id,
                    last_completed_step: last_completed,
                    source: MemoryError::cancelled(),
                });
            }

            self.interceptor.before(&step_id, &state).await;

            let ctx = StepContext::new(shared, scope.clone(), cancellation.clone());
            let mut attempt = 0u32;
            let result = loop {
                match step.run(&mut state, &ctx).await {
                    Ok(()) => break Ok(()),
                    Err(err) if err.kind.is_retryable() && attempt < self.retry.max_attempts => {
                        let delay = self.retry.backoff(attempt);
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    Err(err) => break Err(err),
                }
            };

            match result {
                Ok(()) => {
                    self.interceptor.after(&step_id, &state).await;
                    last_completed = Some(step_id.clone());
                }
                Err(err) => {
                    self.interceptor.on_error(&step_id, &err).await;
                    return Err(RunError {
                        step_id,
                        last_completed_step: last_completed,
                        source: err,
                    });
                }
            }

            if state.is_halted() {
                break;
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Step, StepSpec};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct HaltingStep(StepSpec);

    #[async_trait]
    impl Step<()> for HaltingStep {
        fn spec(&self) -> &StepSpec {
            &self.0
        }
        async fn run(&self, state: &mut PipelineState, _ctx: &StepContext<'_, ()>) -> Result<(), MemoryError> {
            state.halt("done early");
            Ok(())
        }
    }

    struct UnreachableStep(StepSpec);

    #[async_trait]
    impl Step<()> for UnreachableStep {
        fn spec(&self) -> &StepSpec {
            &self.0
        }
        async fn run(&self, _state: &mut PipelineState, _ctx: &StepContext<'_, ()>) -> Result<(), MemoryError> {
            panic!("should not run after halt");
        }
    }

    struct FlakyStep {
        spec: StepSpec,
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl Step<()> for FlakyStep {
        fn spec(&self) -> &StepSpec {
            &self.spec
        }
        async fn run(&self, state: &mut PipelineState, _ctx: &StepContext<'_, ()>) -> Result<(), MemoryError> {
            if self.failures_left.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(MemoryError::backend_unavailable("transient"));
            }
            state.set("ok", serde_json::json!(true));
            Ok(())
        }
    }

    fn pipeline_with(steps: Vec<Arc<dyn Step<()>>>) -> Pipeline<()> {
        let mut p = Pipeline::<()>::new("p", Vec::<String>::new());
        p.steps = steps;
        p
    }

    #[tokio::test]
    async fn halt_skips_remaining_steps() {
        let steps: Vec<Arc<dyn Step<()>>> = vec![
            Arc::new(HaltingStep(StepSpec::new("a"))),
            Arc::new(UnreachableStep(StepSpec::new("b"))),
        ];
        let pipeline = pipeline_with(steps);
        let runner = Runner::<()>::new();
        let result = runner
            .run(&pipeline, PipelineState::new(), &(), Scope::new(), CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_halted());
    }

    #[tokio::test]
    async fn cancellation_before_a_step_returns_cancelled_error() {
        let steps: Vec<Arc<dyn Step<()>>> = vec![Arc::new(UnreachableStep(StepSpec::new("a")))];
        let pipeline = pipeline_with(steps);
        let runner = Runner::<()>::new();
        let token = CancellationToken::new();
        token.cancel();
        let err = runner
            .run(&pipeline, PipelineState::new(), &(), Scope::new(), token)
            .await
            .unwrap_err();
        assert_eq!(err.source.kind, crate::error::ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn retries_upstream_failure_until_it_succeeds() {
        let steps: Vec<Arc<dyn Step<()>>> = vec![Arc::new(FlakyStep {
            spec: StepSpec::new("flaky"),
            failures_left: AtomicU32::new(2),
        })];
        let pipeline = pipeline_with(steps);
        let runner = Runner::<()>::new().with_retry(Retry {
            max_attempts: 3,
            base: Duration::from_millis(1),
            cap: Duration::from_millis(4),
        });
        let result = runner
            .run(&pipeline, PipelineState::new(), &(), Scope::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.get_typed::<bool>("ok"), Some(true));
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_completed_step() {
        let steps: Vec<Arc<dyn Step<()>>> = vec![Arc::new(FlakyStep {
            spec: StepSpec::new("flaky"),
            failures_left: AtomicU32::new(10),
        })];
        let pipeline = pipeline_with(steps);
        let runner = Runner::<()>::new().with_retry(Retry {
            max_attempts: 2,
            base: Duration::from_millis(1),
            cap: Duration::from_millis(2),
        });
        let err = runner
            .run(&pipeline, PipelineState::new(), &(), Scope::new(), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.step_id, "flaky");
        assert_eq!(err.last_completed_step, None);
    }
}
