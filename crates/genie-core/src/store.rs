//! The persistence contract (spec §4.6, component C1): session model
//! storage, the distributed per-session lock, and the atomic progress
//! counters that gate dialogue turns. `genie-persistence` implements this
//! against Redis; an in-memory double lives alongside it for tests, the same
//! split the teacher keeps between `event::store::EventStore` and
//! `InMemoryEventStore`.

use async_trait::async_trait;

use genie_domain::{GenieTaskProgress, SessionModel};

use crate::errors::CoreError;

/// An opaque handle to a held session lock. Only the store that issued it
/// knows how to release or renew it; the engine just carries it between
/// `acquire_lock` and `release_lock`.
#[derive(Debug, Clone)]
pub struct LockHandle {
    pub session_id: String,
    pub token: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Blocks (up to an implementation-defined timeout) until the
    /// single-writer-per-session lock is held, or returns
    /// `CoreError::LockAcquireTimeout`.
    async fn acquire_lock(&self, session_id: &str) -> Result<LockHandle, CoreError>;

    async fn release_lock(&self, handle: LockHandle) -> Result<(), CoreError>;

    /// Loads the session model, or `CoreError::UnknownSession` if it has
    /// never been created. Callers must hold the session's lock.
    async fn load_model(&self, session_id: &str) -> Result<SessionModel, CoreError>;

    /// Persists the full model. Callers must hold the session's lock.
    async fn persist_model(&self, model: &SessionModel) -> Result<(), CoreError>;

    async fn progress_start(&self, session_id: &str, task_id: &str, total_subtasks: u64) -> Result<(), CoreError>;

    /// Atomically adds `delta` to the total subtask count, used when a `map`
    /// task discovers its fan-out only once the mapped-over list is
    /// rendered (spec §4.4 rule 5, §5 OQ-2).
    async fn progress_grow_total(&self, session_id: &str, delta: u64) -> Result<(), CoreError>;

    /// Atomically increments the executed-subtask counter by one.
    async fn progress_increment_done(&self, session_id: &str) -> Result<(), CoreError>;

    /// Marks the DAG root task finished; the record becomes eligible for
    /// deletion once `done >= total` (spec §4.8, `GenieTaskProgress::ready`).
    async fn progress_tombstone(&self, session_id: &str) -> Result<(), CoreError>;

    async fn progress_status(&self, session_id: &str) -> Result<Option<GenieTaskProgress>, CoreError>;

    /// Deletes the progress record. Called once `ready()` is observed true.
    async fn progress_delete(&self, session_id: &str) -> Result<(), CoreError>;
}
