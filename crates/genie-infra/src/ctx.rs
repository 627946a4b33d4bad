//! `WorkerCtx`: the shared handle every worker-pool task needs. Plays the
//! role the Design Notes call out as missing from the original ("no single
//! Engine handle ... global module state"): one `Arc`-shared bundle threaded
//! through every DAG execution instead of process-global singletons.

use std::sync::Arc;

use genie_core::listener::DagLauncher;
use genie_core::sm::FlowRegistry;
use genie_core::store::Store;
use genie_core::template_env::TemplateEnvironment;

use crate::task_registry::TaskRegistry;

pub struct WorkerCtx {
    pub env: Arc<dyn TemplateEnvironment>,
    pub store: Arc<dyn Store>,
    pub flow_registry: Arc<FlowRegistry>,
    pub launcher: Arc<dyn DagLauncher>,
    pub task_registry: Arc<TaskRegistry>,
}
