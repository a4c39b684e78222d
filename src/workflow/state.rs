//! The mutable state map a pipeline run operates on.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

/// Why a step short-circuited the remaining pipeline (spec §4.1).
#[derive(Clone, Debug)]
pub struct HaltReason(pub String);

/// Dynamic key-value state threaded through a pipeline run. Steps read their
/// `requires` keys and write their `produces` keys; `halt` short-circuits the
/// runner when set.
#[derive(Clone, Debug, Default)]
pub struct PipelineState {
    values: HashMap<String, JsonValue>,
    pub halt: Option<HaltReason>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_initial(initial: HashMap<String, JsonValue>) -> Self {
        Self {
            values: initial,
            halt: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    pub fn get_typed<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.values.insert(key.into(), value);
    }

    pub fn set_typed<T: serde::Serialize>(&mut self, key: impl Into<String>, value: &T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.set(key, v);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn halt(&mut self, reason: impl Into<String>) {
        self.halt = Some(HaltReason(reason.into()));
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip_typed_value() {
        let mut state = PipelineState::new();
        state.set_typed("count", &3i32);
        assert_eq!(state.get_typed::<i32>("count"), Some(3));
    }

    #[test]
    fn halt_sets_reason_and_flag() {
        let mut state = PipelineState::new();
        assert!(!state.is_halted());
        state.halt("no retrieval needed");
        assert!(state.is_halted());
        assert_eq!(state.halt.unwrap().0, "no retrieval needed");
    }
}
