//! Pipeline: an ordered, revisioned list of steps (spec §4.1).

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::error::PipelineError;
use super::step::{ConfigValue, Step};

/// An ordered list of steps plus the keys available before the first step
/// runs (`initial_inputs`). Cloning a `Pipeline` is cheap: steps are held by
/// `Arc`, so [`super::PipelineManager`] reads can hand out independent
/// snapshots without locking a run in progress.
///
/// Per-step config overlays (`configure_step`) live alongside the steps
/// rather than inside them, since steps are immutable `Arc<dyn Step<C>>`
/// trait objects; [`Pipeline::effective_config`] merges a step's built-in
/// `StepSpec::config` with its overlay at run time.
#[derive(Clone)]
pub struct Pipeline<C: Send + Sync> {
    pub name: String,
    pub(super) steps: Vec<Arc<dyn Step<C>>>,
    pub(super) initial_inputs: BTreeSet<String>,
    pub(super) config_overlays: HashMap<String, HashMap<String, ConfigValue>>,
    pub revision: u64,
}

impl<C: Send + Sync> Pipeline<C> {
    pub fn new(name: impl Into<String>, initial_inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            initial_inputs: initial_inputs.into_iter().map(Into::into).collect(),
            config_overlays: HashMap::new(),
            revision: 0,
        }
    }

    /// Merges a step's declared default config with any overlay installed by
    /// `configure_step`; overlay values win.
    pub fn effective_config(&self, step_id: &str) -> HashMap<String, ConfigValue> {
        let mut merged = self
            .steps
            .iter()
            .find(|s| s.spec().step_id == step_id)
            .map(|s| s.spec().config.clone())
            .unwrap_or_default();
        if let Some(overlay) = self.config_overlays.get(step_id) {
            merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    pub fn steps(&self) -> &[Arc<dyn Step<C>>] {
        &self.steps
    }

    pub fn position_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.spec().step_id == step_id)
    }

    /// Validates `requires ⊆ (produced-so-far ∪ initial_inputs)` for every
    /// step in order (invariant I6). A step whose `produces` overwrites an
    /// earlier step's output is allowed (spec §4.1 calls this "callable but
    /// allowed"); it is not flagged as an error here since there is no
    /// observability channel in this core to surface warnings through.
    pub(super) fn validate(steps: &[Arc<dyn Step<C>>], initial_inputs: &BTreeSet<String>) -> Result<(), PipelineError> {
        let mut produced: BTreeSet<String> = initial_inputs.clone();
        let mut seen_ids: BTreeSet<String> = BTreeSet::new();
        for step in steps {
            let spec = step.spec();
            if !seen_ids.insert(spec.step_id.clone()) {
                return Err(PipelineError::DuplicateStep(spec.step_id.clone()));
            }
            let missing: Vec<String> = spec
                .requires
                .iter()
                .filter(|k| !produced.contains(*k))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(PipelineError::UnsatisfiedRequirement {
                    step_id: spec.step_id.clone(),
                    missing,
                });
            }
            produced.extend(spec.produces.iter().cloned());
        }
        Ok(())
    }
}
