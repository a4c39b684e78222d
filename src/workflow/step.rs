//! Step: one unit of work in a pipeline (spec §4.1).
//!
//! Grounded on the teacher's `graph::Node<S>` trait, generalized from a
//! typed `(state) -> (state, Next)` signature to a dynamic `requires`/
//! `produces` contract validated by [`super::PipelineManager`] before any
//! step runs.

use std::collections::BTreeSet;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::MemoryError;
use crate::scope::Scope;

use super::cancellation::CancellationToken;
use super::state::PipelineState;

/// Informational tag used for routing and observability (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Llm,
    Vector,
    Db,
    Io,
    Vision,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Llm => "llm",
            Capability::Vector => "vector",
            Capability::Db => "db",
            Capability::Io => "io",
            Capability::Vision => "vision",
        }
    }
}

/// A step's mutable configuration value (e.g. `llm_profile: "default"`).
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

/// Declared shape of a step: what it needs, what it writes, and how it is
/// tagged/configured. Immutable once built; [`super::PipelineManager`]
/// mutation methods replace whole steps rather than patching specs in place,
/// except `configure_step` which only updates `config`.
#[derive(Clone, Debug)]
pub struct StepSpec {
    pub step_id: String,
    pub requires: BTreeSet<String>,
    pub produces: BTreeSet<String>,
    pub capabilities: BTreeSet<Capability>,
    pub config: HashMap<String, ConfigValue>,
}

impl StepSpec {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            requires: BTreeSet::new(),
            produces: BTreeSet::new(),
            capabilities: BTreeSet::new(),
            config: HashMap::new(),
        }
    }

    pub fn requires(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.requires.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn produces(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.produces.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn capability(mut self, cap: Capability) -> Self {
        self.capabilities.insert(cap);
        self
    }

    pub fn config(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Everything a step's handler needs besides the state it mutates: shared
/// services (`C`, e.g. LLM cache + repositories), the request scope, and a
/// cooperative cancellation token (spec §5).
pub struct StepContext<'a, C> {
    pub shared: &'a C,
    pub scope: Scope,
    pub cancellation: CancellationToken,
}

impl<'a, C> StepContext<'a, C> {
    pub fn new(shared: &'a C, scope: Scope, cancellation: CancellationToken) -> Self {
        Self {
            shared,
            scope,
            cancellation,
        }
    }

    pub fn check_cancelled(&self) -> Result<(), MemoryError> {
        if self.cancellation.is_cancelled() {
            Err(MemoryError::cancelled())
        } else {
            Ok(())
        }
    }
}

/// One step in a pipeline: declares its contract via [`StepSpec::spec`] and
/// executes via `run`, mutating `state` in place. Handlers read their
/// `requires` keys from `state` and write their `produces` keys back.
#[async_trait]
pub trait Step<C: Send + Sync>: Send + Sync {
    fn spec(&self) -> &StepSpec;

    async fn run(
        &self,
        state: &mut PipelineState,
        ctx: &StepContext<'_, C>,
    ) -> Result<(), MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_requires_and_produces() {
        let spec = StepSpec::new("ingest_resource")
            .requires(["resource_url", "modality"])
            .produces(["resource"])
            .capability(Capability::Io)
            .config("llm_profile", "default");
        assert!(spec.requires.contains("resource_url"));
        assert!(spec.produces.contains("resource"));
        assert!(spec.capabilities.contains(&Capability::Io));
        assert_eq!(spec.config.get("llm_profile").unwrap().as_str(), Some("default"));
    }
}
