//! The session model: one per session id, owned by the Store and loaded into
//! memory only while holding the session lock (spec §3, §5).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dialogue::DialogueElement;

/// Current schema version of `SessionModel`. Bumped whenever the persisted
/// shape changes incompatibly; `genie-persistence` refuses to deserialize a
/// payload whose stamped version differs (spec §3 "no auto-migration").
pub const SESSION_MODEL_SCHEMA_VERSION: u32 = 1;

/// One client-addressable conversation instance.
///
/// `extraction` holds flow-specific fields a concrete flow's entry/exit hooks
/// parse out of `actor_input` (spec §4.2: "Exit/entry hooks may mutate
/// `model`, e.g. parse JSON from `actor_input` into typed fields"). Keeping
/// it as a JSON bag (rather than a generic type parameter threaded through
/// every layer) is the same neutrality trade-off `chem-core::model::Artifact`
/// makes for step outputs: the engine does not need to know the shape, only
/// that it round-trips through serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionModel {
    pub session_id: String,
    pub flow_type_key: String,
    pub state: String,

    #[serde(default)]
    pub dialogue: Vec<DialogueElement>,

    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub actor_input: String,

    /// Accumulates JSON-serialized error records; nullable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_error: Option<Value>,

    #[serde(default)]
    pub extraction: serde_json::Map<String, Value>,

    pub schema_version: u32,
}

impl SessionModel {
    pub fn new(session_id: impl Into<String>, flow_type_key: impl Into<String>, initial_state: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            flow_type_key: flow_type_key.into(),
            state: initial_state.into(),
            dialogue: Vec::new(),
            actor: None,
            actor_input: String::new(),
            task_error: None,
            extraction: serde_json::Map::new(),
            schema_version: SESSION_MODEL_SCHEMA_VERSION,
        }
    }

    pub fn push_dialogue(&mut self, el: DialogueElement) {
        self.dialogue.push(el);
    }

    pub fn latest_assistant_text(&self) -> Option<&str> {
        self.dialogue
            .iter()
            .rev()
            .find(|el| matches!(el.actor, crate::dialogue::Actor::Assistant))
            .map(|el| el.text.as_str())
    }

    pub fn append_task_error(&mut self, record: Value) {
        match &mut self.task_error {
            Some(Value::Array(arr)) => arr.push(record),
            Some(existing) => {
                let prior = existing.clone();
                self.task_error = Some(Value::Array(vec![prior, record]));
            }
            None => self.task_error = Some(Value::Array(vec![record])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::Actor;

    #[test]
    fn latest_assistant_text_skips_user_turns() {
        let mut m = SessionModel::new("s1", "qa", "intro");
        m.push_dialogue(DialogueElement::new(Actor::Assistant, "hello"));
        m.push_dialogue(DialogueElement::new(Actor::User, "hi"));
        assert_eq!(m.latest_assistant_text(), Some("hello"));
    }

    #[test]
    fn append_task_error_accumulates() {
        let mut m = SessionModel::new("s1", "qa", "intro");
        m.append_task_error(serde_json::json!({"exception": "boom"}));
        m.append_task_error(serde_json::json!({"exception": "boom2"}));
        assert_eq!(m.task_error.unwrap().as_array().unwrap().len(), 2);
    }
}
