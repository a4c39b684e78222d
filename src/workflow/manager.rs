//! PipelineManager: registers named pipelines and mutates them (spec §4.1).
//!
//! Shared; mutations acquire a writer lock, reads take a snapshot (spec §5) —
//! grounded on the teacher's shared, lock-guarded collections (e.g.
//! `DashMap`-backed stores) rather than message-passing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::error::PipelineError;
use super::pipeline::Pipeline;
use super::step::Step;

pub struct PipelineManager<C: Send + Sync> {
    pipelines: RwLock<HashMap<String, Pipeline<C>>>,
}

impl<C: Send + Sync> Default for PipelineManager<C> {
    fn default() -> Self {
        Self {
            pipelines: RwLock::new(HashMap::new()),
        }
    }
}

impl<C: Send + Sync> PipelineManager<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new named pipeline from a step list. Fails with
    /// `PipelineInvalid` (via `PipelineError::UnsatisfiedRequirement`/
    /// `DuplicateStep`) without registering anything.
    pub fn register_pipeline(
        &self,
        name: impl Into<String>,
        initial_inputs: impl IntoIterator<Item = impl Into<String>>,
        steps: Vec<Arc<dyn Step<C>>>,
    ) -> Result<(), PipelineError> {
        let name = name.into();
        let initial_inputs = initial_inputs.into_iter().map(Into::into).collect();
        Pipeline::<C>::validate(&steps, &initial_inputs)?;
        let pipeline = Pipeline {
            name: name.clone(),
            steps,
            initial_inputs,
            config_overlays: HashMap::new(),
            revision: 0,
        };
        self.pipelines.write().unwrap().insert(name, pipeline);
        Ok(())
    }

    /// Returns an immutable snapshot of the named pipeline (cheap clone: steps
    /// are `Arc`-backed). Concurrent mutations do not affect a snapshot
    /// already taken by an in-flight run.
    pub fn snapshot(&self, name: &str) -> Result<Pipeline<C>, PipelineError> {
        self.pipelines
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(name.to_string()))
    }

    pub fn revision(&self, name: &str) -> Result<u64, PipelineError> {
        Ok(self.snapshot(name)?.revision)
    }

    /// Merges `configs` into the named step's config overlay (spec §4.1).
    /// Does not change `requires`/`produces`, so the step list itself is
    /// left untouched; only the overlay and the revision counter change.
    pub fn configure_step(
        &self,
        pipeline: &str,
        step_id: &str,
        configs: HashMap<String, super::step::ConfigValue>,
    ) -> Result<u64, PipelineError> {
        let mut guard = self.pipelines.write().unwrap();
        let entry = guard
            .get_mut(pipeline)
            .ok_or_else(|| PipelineError::NotFound(pipeline.to_string()))?;
        if !entry.steps.iter().any(|s| s.spec().step_id == step_id) {
            return Err(PipelineError::StepNotFound(step_id.to_string(), pipeline.to_string()));
        }
        entry
            .config_overlays
            .entry(step_id.to_string())
            .or_default()
            .extend(configs);
        entry.revision += 1;
        Ok(entry.revision)
    }

    pub fn insert_step_before(
        &self,
        pipeline: &str,
        target: &str,
        new_step: Arc<dyn Step<C>>,
    ) -> Result<u64, PipelineError> {
        self.mutate(pipeline, |steps| {
            let pos = steps
                .iter()
                .position(|s| s.spec().step_id == target)
                .ok_or_else(|| PipelineError::StepNotFound(target.to_string(), pipeline.to_string()))?;
            steps.insert(pos, new_step.clone());
            Ok(())
        })
    }

    pub fn insert_step_after(
        &self,
        pipeline: &str,
        target: &str,
        new_step: Arc<dyn Step<C>>,
    ) -> Result<u64, PipelineError> {
        self.mutate(pipeline, |steps| {
            let pos = steps
                .iter()
                .position(|s| s.spec().step_id == target)
                .ok_or_else(|| PipelineError::StepNotFound(target.to_string(), pipeline.to_string()))?;
            steps.insert(pos + 1, new_step.clone());
            Ok(())
        })
    }

    pub fn replace_step(
        &self,
        pipeline: &str,
        target: &str,
        new_step: Arc<dyn Step<C>>,
    ) -> Result<u64, PipelineError> {
        self.mutate(pipeline, |steps| {
            let pos = steps
                .iter()
                .position(|s| s.spec().step_id == target)
                .ok_or_else(|| PipelineError::StepNotFound(target.to_string(), pipeline.to_string()))?;
            steps[pos] = new_step.clone();
            Ok(())
        })
    }

    pub fn remove_step(&self, pipeline: &str, target: &str) -> Result<u64, PipelineError> {
        self.mutate(pipeline, |steps| {
            let pos = steps
                .iter()
                .position(|s| s.spec().step_id == target)
                .ok_or_else(|| PipelineError::StepNotFound(target.to_string(), pipeline.to_string()))?;
            steps.remove(pos);
            Ok(())
        })
    }

    /// Applies `f` to a working copy of the pipeline's steps, re-validates,
    /// and only then commits + bumps the revision. On validation failure the
    /// pipeline is left completely unchanged (its revision included).
    fn mutate(
        &self,
        pipeline: &str,
        f: impl FnOnce(&mut Vec<Arc<dyn Step<C>>>) -> Result<(), PipelineError>,
    ) -> Result<u64, PipelineError> {
        let mut guard = self.pipelines.write().unwrap();
        let existing = guard
            .get(pipeline)
            .ok_or_else(|| PipelineError::NotFound(pipeline.to_string()))?;
        let mut steps = existing.steps.clone();
        let initial_inputs = existing.initial_inputs.clone();
        f(&mut steps)?;
        Pipeline::<C>::validate(&steps, &initial_inputs)?;
        let entry = guard.get_mut(pipeline).unwrap();
        entry.steps = steps;
        entry.revision += 1;
        Ok(entry.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{PipelineState, Step, StepContext, StepSpec};
    use async_trait::async_trait;
    use crate::error::MemoryError;

    struct DummyStep(StepSpec);

    #[async_trait]
    impl Step<()> for DummyStep {
        fn spec(&self) -> &StepSpec {
            &self.0
        }
        async fn run(&self, _state: &mut PipelineState, _ctx: &StepContext<'_, ()>) -> Result<(), MemoryError> {
            Ok(())
        }
    }

    fn step(id: &str, requires: &[&str], produces: &[&str]) -> Arc<dyn Step<()>> {
        Arc::new(DummyStep(
            StepSpec::new(id).requires(requires.to_vec()).produces(produces.to_vec()),
        ))
    }

    #[test]
    fn register_rejects_unsatisfied_requirement() {
        let mgr = PipelineManager::<()>::new();
        let steps = vec![step("a", &["missing"], &["x"])];
        let err = mgr.register_pipeline("p", Vec::<String>::new(), steps).unwrap_err();
        assert!(matches!(err, PipelineError::UnsatisfiedRequirement { .. }));
    }

    #[test]
    fn insert_before_revalidates_and_bumps_revision() {
        // b requires "mid", which nothing produces yet, so the pipeline is
        // built up incrementally: register with b's requirement satisfied by
        // "in" first, then insert "a" in front of it to actually produce "mid".
        let mgr2 = PipelineManager::<()>::new();
        mgr2.register_pipeline("p", vec!["in"], vec![step("b", &["in"], &["out"])])
            .unwrap();
        let rev = mgr2
            .insert_step_before("p", "b", step("a", &["in"], &["mid"]))
            .unwrap();
        assert_eq!(rev, 1);
        let snap = mgr2.snapshot("p").unwrap();
        assert_eq!(snap.steps()[0].spec().step_id, "a");
    }

    #[test]
    fn insert_before_rejects_when_dependency_still_unmet() {
        let mgr = PipelineManager::<()>::new();
        mgr.register_pipeline("p", vec!["in"], vec![step("b", &["in"], &["out"])])
            .unwrap();
        // Inserting a step that itself needs "mid" (nobody produces it) must fail
        // and leave revision at 0.
        let err = mgr.insert_step_before("p", "b", step("a", &["mid"], &["in"]));
        assert!(err.is_err());
        assert_eq!(mgr.revision("p").unwrap(), 0);
    }

    #[test]
    fn remove_step_rejects_if_later_step_still_needs_it() {
        let mgr = PipelineManager::<()>::new();
        mgr.register_pipeline(
            "p",
            vec!["in"],
            vec![step("a", &["in"], &["mid"]), step("b", &["mid"], &["out"])],
        )
        .unwrap();
        let err = mgr.remove_step("p", "a");
        assert!(err.is_err());
        assert_eq!(mgr.revision("p").unwrap(), 0);
    }
}
