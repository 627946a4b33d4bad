//! Reusable entry/exit/event hooks (spec §4.2: "may mutate `model`, e.g.
//! parse JSON from `actor_input` into typed fields"), ported from the
//! `on_exit_<state>` action methods in
//! `examples/original_source/example_qa/q_and_a_capture.py`
//! (`on_exit_ai_extracts_name` copies `actor_input` into a typed model
//! field once an AI extraction step has run).
//!
//! Unlike the guards in [`crate::guards`], these need per-flow parameters
//! (which field to write), so they're small structs rather than bare `fn`s.

use serde_json::Value;

use genie_core::sm::Hook;
use genie_domain::SessionModel;

/// Copies `model.actor_input` verbatim into `model.extraction[field]`,
/// ported from `on_exit_ai_extracts_name`'s `self.model.user_name =
/// self.model.actor_input`.
pub struct CaptureActorInputAsField {
    field: String,
}

impl CaptureActorInputAsField {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl Hook for CaptureActorInputAsField {
    fn call(&self, model: &mut SessionModel, _args: &[Value]) {
        model.extraction.insert(self.field.clone(), Value::String(model.actor_input.clone()));
    }
}

/// Parses `model.actor_input` as JSON and shallow-merges its top-level keys
/// into `model.extraction`, for invoker responses that return a structured
/// object rather than plain text (the AI-extraction analogue of
/// `on_exit_ai_extracts_name`, generalized past a single scalar field).
/// Non-object or unparseable input is ignored rather than erroring, since a
/// hook has no way to reject the transition it runs under.
pub struct MergeActorInputJsonIntoExtraction;

impl Hook for MergeActorInputJsonIntoExtraction {
    fn call(&self, model: &mut SessionModel, _args: &[Value]) {
        match serde_json::from_str::<Value>(&model.actor_input) {
            Ok(Value::Object(map)) => {
                for (key, value) in map {
                    model.extraction.insert(key, value);
                }
            }
            Ok(_) => tracing::debug!(session_id = %model.session_id, "actor_input JSON was not an object, skipping merge"),
            Err(_) => tracing::debug!(session_id = %model.session_id, "actor_input was not valid JSON, skipping merge"),
        }
    }
}

/// A hook that does nothing, for flows that need an explicit no-op entry in
/// a hook table rather than an absent key.
pub fn noop(_model: &mut SessionModel, _args: &[Value]) {}

#[cfg(test)]
mod tests {
    use super::*;
    use genie_core::sm::Hook as _;

    #[test]
    fn capture_actor_input_writes_field() {
        let mut model = SessionModel::new("s1", "qa", "ai_extracts_name");
        model.actor_input = "Ada".to_string();
        CaptureActorInputAsField::new("user_name").call(&mut model, &[]);
        assert_eq!(model.extraction.get("user_name").and_then(Value::as_str), Some("Ada"));
    }

    #[test]
    fn merge_json_extracts_object_keys() {
        let mut model = SessionModel::new("s1", "qa", "ai_extracts_name");
        model.actor_input = r#"{"user_name": "Ada", "confidence": 0.9}"#.to_string();
        MergeActorInputJsonIntoExtraction.call(&mut model, &[]);
        assert_eq!(model.extraction.get("user_name").and_then(Value::as_str), Some("Ada"));
        assert_eq!(model.extraction.get("confidence").and_then(Value::as_f64), Some(0.9));
    }

    #[test]
    fn merge_json_ignores_non_object_input() {
        let mut model = SessionModel::new("s1", "qa", "ai_extracts_name");
        model.actor_input = "not json".to_string();
        MergeActorInputJsonIntoExtraction.call(&mut model, &[]);
        assert!(model.extraction.is_empty());
    }
}
