//! External wire shapes (spec §6): the four Session Manager operations speak
//! these exactly, whatever transport (`genie-cli`'s HTTP surface, or a
//! direct in-process caller like the root demo) sits in front of them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressDto {
    pub total_number_of_subtasks: u64,
    pub number_of_subtasks_executed: u64,
}

/// The reply to `start_session`/`process_event` (spec §4.1). Exactly one of
/// `response`/`error` is set on a resolved turn; `progress` is set only
/// while a DAG is in flight and `next_actions == ["poll"]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub next_actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressDto>,
}

/// The reply to `get_task_state` (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub session_id: String,
    pub ready: bool,
    pub next_actions: Vec<String>,
}

/// The `POST event` request body (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub session_id: String,
    pub event: String,
    #[serde(default)]
    pub event_input: Value,
}
