//! The concrete `DagLauncher` (spec §4.8, component C8's runtime half):
//! compiles a target template into a `CompiledDag`, starts its progress
//! record, and enqueues it — exactly the three steps the Transition Listener
//! delegates for an INVOKER target.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use genie_core::compiler::TaskGraphCompiler;
use genie_core::listener::DagLauncher;
use genie_core::store::Store;
use genie_core::template::Template;
use genie_core::CoreError;

use crate::queue::TaskQueue;

pub struct QueueDagLauncher {
    compiler: TaskGraphCompiler,
    queue: Arc<dyn TaskQueue>,
    store: Arc<dyn Store>,
}

impl QueueDagLauncher {
    pub fn new(queue: Arc<dyn TaskQueue>, store: Arc<dyn Store>) -> Self {
        Self { compiler: TaskGraphCompiler::new(), queue, store }
    }
}

#[async_trait]
impl DagLauncher for QueueDagLauncher {
    async fn launch(
        &self,
        template: &Template,
        render_data: Value,
        session_id: &str,
        flow_type_key: &str,
        event_to_send_after: &str,
    ) -> Result<(), CoreError> {
        let dag = self.compiler.compile(template, render_data, session_id, flow_type_key, event_to_send_after);
        let task_id = Uuid::new_v4().to_string();
        self.store.progress_start(session_id, &task_id, dag.subtask_count).await?;
        tracing::info!(session_id, flow_type_key, subtask_count = dag.subtask_count, "launched DAG");
        self.queue.enqueue(dag).await
    }
}
