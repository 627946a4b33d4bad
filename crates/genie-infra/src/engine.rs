//! `Engine`: bundles a `FlowRegistry`, `Store`, `TemplateEnvironment`, and
//! the worker pool/queue into one handle a binary can hold onto — the
//! "explicit Engine handle" the Design Notes (spec §9) call for in place of
//! the original's global module state.

use std::sync::Arc;

use genie_core::listener::DagLauncher;
use genie_core::sm::FlowRegistry;
use genie_core::store::Store;
use genie_core::template_env::TemplateEnvironment;

use crate::ctx::WorkerCtx;
use crate::launcher::QueueDagLauncher;
use crate::queue::{InMemoryTaskQueue, TaskQueue};
use crate::session_manager::SessionManager;
use crate::task_registry::TaskRegistry;

pub struct Engine {
    pub registry: Arc<FlowRegistry>,
    pub store: Arc<dyn Store>,
    pub env: Arc<dyn TemplateEnvironment>,
    pub task_queue: Arc<dyn TaskQueue>,
    pub session_manager: SessionManager,
}

impl Engine {
    /// Wires an `InMemoryTaskQueue` with `worker_count` competing workers, a
    /// `QueueDagLauncher` over it, and a `SessionManager` over all of the
    /// above. The queue and its launcher are built in two steps (queue first
    /// without its workers, then the `WorkerCtx` the workers need, which
    /// itself needs the launcher the queue backs) to break what would
    /// otherwise be a construction cycle.
    pub fn new(
        registry: Arc<FlowRegistry>,
        store: Arc<dyn Store>,
        env: Arc<dyn TemplateEnvironment>,
        task_registry: TaskRegistry,
        worker_count: usize,
    ) -> Self {
        let (queue, receiver) = InMemoryTaskQueue::new();
        let launcher: Arc<dyn DagLauncher> = Arc::new(QueueDagLauncher::new(queue.clone(), store.clone()));

        let ctx = Arc::new(WorkerCtx {
            env: env.clone(),
            store: store.clone(),
            flow_registry: registry.clone(),
            launcher: launcher.clone(),
            task_registry: Arc::new(task_registry),
        });
        InMemoryTaskQueue::spawn_workers(receiver, worker_count.max(1), ctx);

        let session_manager = SessionManager::new(registry.clone(), store.clone(), env.clone(), launcher);

        Self { registry, store, env, task_queue: queue, session_manager }
    }
}
