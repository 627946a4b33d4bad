//! The shared queue workers pull compiled DAGs from (spec §4.5 "Workers are
//! stateless executors pulled from a shared queue"). `InMemoryTaskQueue` is
//! the default, `tokio::mpsc`-backed implementation — the same in-memory
//! default the teacher's `EventStore` trait keeps alongside its real
//! backend, here sized to a fixed worker-pool count instead of an unbounded
//! one (spec §9's "explicit Engine handle" wiring).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use genie_core::worker::CompiledDag;
use genie_core::CoreError;

use crate::ctx::WorkerCtx;
use crate::executor;

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, dag: CompiledDag) -> Result<(), CoreError>;
}

pub struct InMemoryTaskQueue {
    sender: mpsc::UnboundedSender<CompiledDag>,
}

impl InMemoryTaskQueue {
    /// Builds the queue and hands back the receiving half separately, since
    /// spawning the worker loops needs a fully-built [`WorkerCtx`] (which in
    /// turn needs a `DagLauncher` built from this same queue) — see
    /// [`InMemoryTaskQueue::spawn_workers`].
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<CompiledDag>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }

    /// Spawns `worker_count` loops competing for the same receiver (a fixed
    /// worker pool, per spec §4.5), each executing whatever `CompiledDag` it
    /// dequeues to completion via `crate::executor::run_dag`.
    pub fn spawn_workers(receiver: mpsc::UnboundedReceiver<CompiledDag>, worker_count: usize, ctx: Arc<WorkerCtx>) {
        let receiver = Arc::new(Mutex::new(receiver));
        for worker_id in 0..worker_count {
            let receiver = receiver.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                loop {
                    let dag = { receiver.lock().await.recv().await };
                    match dag {
                        Some(dag) => executor::run_dag(dag, ctx.clone()).await,
                        None => {
                            tracing::debug!(worker_id, "task queue closed, worker shutting down");
                            break;
                        }
                    }
                }
            });
        }
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, dag: CompiledDag) -> Result<(), CoreError> {
        self.sender.send(dag).map_err(|_| CoreError::Internal("task queue is closed, no workers are running".to_string()))
    }
}
