//! Shared run state and task output types.
//!
//! `FlowState` is the key/value payload that flows between nodes during a run.
//! Tasks read it, may mutate it in place, and hand back a `TaskOutput` whose
//! update map the engine merges afterwards.

use serde::Serialize;
use serde_json::{Map, Value};

/// String-keyed value map used for initial state and partial updates.
pub type StateMap = Map<String, Value>;

/// Mutable key/value state owned by a single workflow run.
///
/// Created fresh per run from the caller-supplied initial map. The only bulk
/// mutator is [`FlowState::update`], a right-biased merge: incoming keys
/// overwrite existing values, every other key is preserved. There is no delete.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FlowState {
    data: StateMap,
}

impl FlowState {
    /// Create state from the caller-supplied initial map.
    pub fn new(initial: StateMap) -> Self {
        Self { data: initial }
    }

    /// Merge a partial update into the state. Empty updates are a no-op.
    pub fn update(&mut self, partial: StateMap) {
        if partial.is_empty() {
            return;
        }
        for (key, value) in partial {
            self.data.insert(key, value);
        }
    }

    /// Insert a single value directly, for tasks that mutate state in place
    /// rather than going through the returned update map.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// String lookup with a default for missing or non-string values.
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.data.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    /// Typed lookup; `None` when the key is absent or the shape doesn't fit.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Read-only view of the underlying map.
    pub fn data(&self) -> &StateMap {
        &self.data
    }

    /// Consume the state, yielding the final map.
    pub fn into_data(self) -> StateMap {
        self.data
    }
}

/// What a task hands back to the engine: a partial state update plus an
/// optional routing decision.
///
/// The decision is a first-class field consulted only by the owning node's
/// transition rule; it is never merged into the run state.
#[derive(Debug, Clone, Default)]
pub struct TaskOutput {
    /// Keys to merge into the run state (right-biased, see [`FlowState::update`]).
    pub update: StateMap,
    /// Routing decision for nodes wired with a decision table.
    pub decision: Option<String>,
}

impl TaskOutput {
    /// Output with no update and no decision.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one key to the update map.
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.update.insert(key.into(), value);
        self
    }

    /// Attach a routing decision.
    pub fn decide(mut self, decision: impl Into<String>) -> Self {
        self.decision = Some(decision.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> StateMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn update_overwrites_colliding_keys_and_preserves_the_rest() {
        let mut state = FlowState::new(map(&[("a", json!(1)), ("b", json!("keep"))]));
        state.update(map(&[("a", json!(2)), ("c", json!(true))]));

        assert_eq!(state.get("a"), Some(&json!(2)));
        assert_eq!(state.get("b"), Some(&json!("keep")));
        assert_eq!(state.get("c"), Some(&json!(true)));
    }

    #[test]
    fn update_is_idempotent() {
        let partial = map(&[("a", json!(5)), ("b", json!("x"))]);

        let mut once = FlowState::new(map(&[("seed", json!(0))]));
        once.update(partial.clone());

        let mut twice = FlowState::new(map(&[("seed", json!(0))]));
        twice.update(partial.clone());
        twice.update(partial);

        assert_eq!(once.data(), twice.data());
    }

    #[test]
    fn empty_update_is_a_noop() {
        let mut state = FlowState::new(map(&[("a", json!(1))]));
        state.update(StateMap::new());
        assert_eq!(state.data().len(), 1);
        assert_eq!(state.get("a"), Some(&json!(1)));
    }

    #[test]
    fn reads_never_fail_on_missing_keys() {
        let state = FlowState::new(StateMap::new());
        assert_eq!(state.get("missing"), None);
        assert_eq!(state.get_str_or("missing", "fallback"), "fallback");
        assert_eq!(state.get_as::<Vec<String>>("missing"), None);
    }

    #[test]
    fn get_str_or_defaults_on_non_string_values() {
        let state = FlowState::new(map(&[("n", json!(42))]));
        assert_eq!(state.get_str_or("n", ""), "");
    }

    #[test]
    fn task_output_builder_keeps_decision_out_of_the_update_map() {
        let output = TaskOutput::new().set("k", json!("v")).decide("done");
        assert_eq!(output.update.get("k"), Some(&json!("v")));
        assert!(!output.update.contains_key("decision"));
        assert_eq!(output.decision.as_deref(), Some("done"));
    }
}
