//! Small helpers shared across pipeline steps.

use crate::workflow::StepSpec;

/// Reads a `String`-valued config key off a step's spec, falling back to a
/// caller-supplied default (steps embed their configured profile names etc.
/// in `StepSpec::config` at registration time).
pub(crate) fn cfg_str<'a>(spec: &'a StepSpec, key: &str, default: &'a str) -> &'a str {
    spec.config.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

pub(crate) fn cfg_f64(spec: &StepSpec, key: &str, default: f64) -> f64 {
    spec.config.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
}

pub(crate) fn cfg_bool(spec: &StepSpec, key: &str, default: bool) -> bool {
    spec.config.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

pub(crate) fn cfg_i64(spec: &StepSpec, key: &str, default: i64) -> i64 {
    spec.config.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}
