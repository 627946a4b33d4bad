//! Dialogue elements recorded against a session, per spec §3.
//!
//! `dialogue` is append-only during a transition and persisted with the
//! session model; it is the only place user-visible conversation text lives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who originated a dialogue element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    System,
    Assistant,
    User,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::System => "system",
            Actor::Assistant => "assistant",
            Actor::User => "user",
        }
    }
}

/// One turn of recorded conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueElement {
    pub actor: Actor,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl DialogueElement {
    pub fn new(actor: Actor, text: impl Into<String>) -> Self {
        Self { actor, timestamp: Utc::now(), text: text.into() }
    }
}
