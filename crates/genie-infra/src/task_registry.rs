//! `TaskRegistry`: string name -> async task, the home for `TaskRef` leaves
//! (spec §3 "TaskRef -- opaque worker task reference", §4.4 rule
//! "`TaskRef(t)`: one `t(R, session_id)` signature"). The closed built-in
//! task kinds (`invoke`, `chain_ctx`, `combine_dict`, `combine_list`, `map`)
//! are handled structurally by `crate::executor` since they need to walk the
//! compiled DAG shape itself; this registry is the extension point for
//! flow-specific tasks a `Template::TaskRef` names directly, mirroring the
//! Design Notes' "Worker tasks are registered by string name in a
//! TaskRegistry".

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use genie_core::CoreError;

#[async_trait]
pub trait OpaqueTask: Send + Sync {
    /// Runs this task against the render-data snapshot available at the
    /// point `TaskRef` was reached, returning the raw string result a
    /// downstream `chain_ctx`/`combine_*` would consume exactly like an
    /// `invoke` leaf's result.
    async fn run(&self, render_data: Value, session_id: &str) -> Result<String, CoreError>;
}

/// Adapts a plain async closure to [`OpaqueTask`], for tests and for
/// registering small one-off tasks without naming a struct.
pub struct FnTask<F>(pub F);

#[async_trait]
impl<F, Fut> OpaqueTask for FnTask<F>
where
    F: Fn(Value, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, CoreError>> + Send,
{
    async fn run(&self, render_data: Value, session_id: &str) -> Result<String, CoreError> {
        let fut: Pin<Box<dyn Future<Output = Result<String, CoreError>> + Send>> = Box::pin((self.0)(render_data, session_id.to_string()));
        fut.await
    }
}

#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Arc<dyn OpaqueTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, task: impl OpaqueTask + 'static) {
        self.tasks.insert(name.into(), Arc::new(task));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn OpaqueTask>> {
        self.tasks.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_fn_task_runs_and_resolves_by_name() {
        let mut registry = TaskRegistry::new();
        registry.register("echo_session", FnTask(|_render_data, session_id| async move { Ok(session_id) }));

        let task = registry.get("echo_session").unwrap();
        let result = task.run(Value::Null, "s1").await.unwrap();
        assert_eq!(result, "s1");
        assert!(registry.get("missing").is_none());
    }
}
