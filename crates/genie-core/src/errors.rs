//! Error taxonomy for the core engine (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown flow type: {0}")]
    UnknownFlow(String),

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("event {received_event:?} not allowed from state {current_state:?} (allowed: {possible_events:?})")]
    TransitionNotAllowed {
        current_state: String,
        possible_events: Vec<String>,
        received_event: String,
    },

    #[error("invoker error: {0}")]
    InvokerError(String),

    #[error("persistence error: {0}")]
    PersistenceError(String),

    #[error("schema mismatch: stored version {stored}, expected {expected}")]
    SchemaMismatch { stored: u32, expected: u32 },

    #[error("timed out acquiring lock for session {0}")]
    LockAcquireTimeout(String),

    #[error("template error: {0}")]
    TemplateError(String),

    #[error("internal: {0}")]
    Internal(String),
}
