//! `SessionGuard`: an RAII-flavoured lock-scoped access guard, ported from
//! `SessionLockManager.ModelContextManager` in
//! `examples/original_source/genie_flow/session_lock.py` ("obtains a lock
//! for a particular session, then retrieves the model from store; upon exit
//! stores the model back and releases the lock"). Rust cannot run async code
//! in `Drop`, so `commit`/`discard` are explicit async methods rather than a
//! context-manager exit; `Drop` only warns if neither was called before the
//! guard went out of scope — the lock still clears on TTL expiry, it just
//! isn't released early.

use std::sync::Arc;

use genie_core::store::Store;
use genie_core::CoreError;
use genie_domain::SessionModel;

pub struct SessionGuard {
    store: Arc<dyn Store>,
    lock: Option<genie_core::store::LockHandle>,
    pub model: SessionModel,
    finished: bool,
}

impl SessionGuard {
    pub async fn acquire(store: Arc<dyn Store>, session_id: &str) -> Result<Self, CoreError> {
        let lock = store.acquire_lock(session_id).await?;
        let model = store.load_model(session_id).await?;
        Ok(Self { store, lock: Some(lock), model, finished: false })
    }

    /// Persists the (possibly mutated) model, then releases the lock.
    pub async fn commit(mut self) -> Result<(), CoreError> {
        self.store.persist_model(&self.model).await?;
        self.finished = true;
        if let Some(lock) = self.lock.take() {
            self.store.release_lock(lock).await?;
        }
        Ok(())
    }

    /// Releases the lock without persisting — used when a dispatch failed
    /// validation (e.g. `TransitionNotAllowed`) and the model must not change.
    pub async fn discard(mut self) -> Result<(), CoreError> {
        self.finished = true;
        if let Some(lock) = self.lock.take() {
            self.store.release_lock(lock).await?;
        }
        Ok(())
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                session_id = %self.model.session_id,
                "SessionGuard dropped without commit()/discard(); lock will clear on TTL expiry only"
            );
        }
    }
}
