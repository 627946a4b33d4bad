//! `GenieTaskProgress`: one record per in-flight DAG, keyed by session id
//! (spec §3). Lives in Redis as a hash in production (`genie-persistence`);
//! this type is the neutral shape both the Redis store and the in-memory
//! test double serialize to/from.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenieTaskProgress {
    pub task_id: String,
    pub total_nr_subtasks: u64,
    pub nr_subtasks_executed: u64,
    pub tombstone: bool,
}

impl GenieTaskProgress {
    pub fn start(task_id: impl Into<String>, total: u64) -> Self {
        Self { task_id: task_id.into(), total_nr_subtasks: total, nr_subtasks_executed: 0, tombstone: false }
    }

    /// Per spec §5 the progress record is ready to delete exactly when
    /// `done >= total AND tombstone`. `done` may legitimately exceed `total`
    /// if a `map` task expands the subtask count after some siblings have
    /// already completed (OQ-2 in DESIGN.md).
    pub fn is_deletable(&self) -> bool {
        self.tombstone && self.nr_subtasks_executed >= self.total_nr_subtasks
    }

    pub fn ready(&self) -> bool {
        self.is_deletable()
    }
}
