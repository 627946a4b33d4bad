//! In-memory `Store` double, the same role `InMemoryEventStore` plays for
//! the teacher's `EventStore` trait: deterministic tests without a live
//! Redis.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use genie_core::store::{LockHandle, Store};
use genie_core::CoreError;
use genie_domain::{GenieTaskProgress, SessionModel};

#[derive(Default)]
pub struct InMemoryStore {
    models: Mutex<HashMap<String, SessionModel>>,
    locks: Mutex<HashMap<String, String>>,
    progress: Mutex<HashMap<String, GenieTaskProgress>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, model: SessionModel) {
        self.models.lock().unwrap().insert(model.session_id.clone(), model);
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn acquire_lock(&self, session_id: &str) -> Result<LockHandle, CoreError> {
        let token = Uuid::new_v4().to_string();
        let mut attempts = 0;
        loop {
            {
                let mut locks = self.locks.lock().unwrap();
                if !locks.contains_key(session_id) {
                    locks.insert(session_id.to_string(), token.clone());
                    return Ok(LockHandle { session_id: session_id.to_string(), token });
                }
            }
            attempts += 1;
            if attempts > 50 {
                return Err(CoreError::LockAcquireTimeout(session_id.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn release_lock(&self, handle: LockHandle) -> Result<(), CoreError> {
        let mut locks = self.locks.lock().unwrap();
        if locks.get(&handle.session_id) == Some(&handle.token) {
            locks.remove(&handle.session_id);
        }
        Ok(())
    }

    async fn load_model(&self, session_id: &str) -> Result<SessionModel, CoreError> {
        self.models
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))
    }

    async fn persist_model(&self, model: &SessionModel) -> Result<(), CoreError> {
        self.models.lock().unwrap().insert(model.session_id.clone(), model.clone());
        Ok(())
    }

    async fn progress_start(&self, session_id: &str, task_id: &str, total_subtasks: u64) -> Result<(), CoreError> {
        self.progress.lock().unwrap().insert(session_id.to_string(), GenieTaskProgress::start(task_id, total_subtasks));
        Ok(())
    }

    async fn progress_grow_total(&self, session_id: &str, delta: u64) -> Result<(), CoreError> {
        let mut progress = self.progress.lock().unwrap();
        let record = progress.get_mut(session_id).ok_or_else(|| CoreError::PersistenceError(format!("no progress record for {session_id}")))?;
        record.total_nr_subtasks += delta;
        Ok(())
    }

    // Matches Redis's HINCRBY: it creates the field from zero rather than erroring
    // when the hash (or field) doesn't exist yet, so a missing record is a no-op here.
    async fn progress_increment_done(&self, session_id: &str) -> Result<(), CoreError> {
        let mut progress = self.progress.lock().unwrap();
        if let Some(record) = progress.get_mut(session_id) {
            record.nr_subtasks_executed += 1;
        }
        Ok(())
    }

    // Matches Redis's HSET: setting a field on a hash that no longer exists
    // (already deleted, e.g. by a concurrent trigger_event) is a no-op, not an error.
    async fn progress_tombstone(&self, session_id: &str) -> Result<(), CoreError> {
        let mut progress = self.progress.lock().unwrap();
        if let Some(record) = progress.get_mut(session_id) {
            record.tombstone = true;
        }
        Ok(())
    }

    async fn progress_status(&self, session_id: &str) -> Result<Option<GenieTaskProgress>, CoreError> {
        Ok(self.progress.lock().unwrap().get(session_id).cloned())
    }

    async fn progress_delete(&self, session_id: &str) -> Result<(), CoreError> {
        self.progress.lock().unwrap().remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn progress_lifecycle_matches_gating_rule() {
        let store = InMemoryStore::new();
        store.progress_start("s1", "task-1", 2).await.unwrap();
        store.progress_increment_done("s1").await.unwrap();
        let status = store.progress_status("s1").await.unwrap().unwrap();
        assert!(!status.is_deletable());

        store.progress_increment_done("s1").await.unwrap();
        store.progress_tombstone("s1").await.unwrap();
        let status = store.progress_status("s1").await.unwrap().unwrap();
        assert!(status.is_deletable());

        store.progress_delete("s1").await.unwrap();
        assert!(store.progress_status("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_unknown_session_errors() {
        let store = InMemoryStore::new();
        let err = store.load_model("missing").await.unwrap_err();
        assert!(matches!(err, CoreError::UnknownSession(_)));
    }
}
