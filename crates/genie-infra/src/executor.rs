//! The I/O-bound half of the Worker Runtime (spec §4.5, component C5):
//! `genie-core::worker` owns the task shapes and the pure helpers
//! (`chain_ctx`, `combine_dict`, `combine_list`, `resolve_map_contexts`);
//! this module walks a `CompiledDag` and actually calls the Template
//! Environment, the Store's progress counters, and — for `trigger_event`/
//! `error_handler` — the session lock and the State Machine Runtime.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use genie_core::sm::StateMachine;
use genie_core::worker::{chain_ctx, combine_dict, combine_list, resolve_map_contexts, CompiledDag, ErrorHandlerSpec, Join, TaskNode, TriggerEventSpec};
use genie_core::CoreError;
use genie_persistence::SessionGuard;

use crate::ctx::WorkerCtx;

/// Runs one launched DAG to completion: executes its compiled body, then the
/// `trigger_event` continuation on success or the `error_handler` on
/// failure (spec §4.4 "root is wrapped: `compile(T) | trigger_event(...)`",
/// "error handler is attached to the root signature").
pub async fn run_dag(dag: CompiledDag, ctx: Arc<WorkerCtx>) {
    let session_id = dag.trigger_event.session_id.clone();
    match run_node(dag.root, dag.render_data, ctx.clone(), session_id.clone()).await {
        Ok(previous_result) => {
            if let Err(err) = run_trigger_event(&dag.trigger_event, &previous_result, &ctx).await {
                tracing::error!(session_id = %session_id, error = %err, "trigger_event failed");
            }
        }
        Err(err) => {
            if let Err(handler_err) = run_error_handler(&dag.error_handler, &err, &ctx).await {
                tracing::error!(session_id = %session_id, error = %handler_err, "error_handler itself failed");
            }
        }
    }
}

/// Executes one `TaskNode`, recursing into its children; boxed because
/// `async fn` cannot recurse directly.
fn run_node(node: TaskNode, render_data: Value, ctx: Arc<WorkerCtx>, session_id: String) -> Pin<Box<dyn Future<Output = Result<String, CoreError>> + Send>> {
    Box::pin(async move {
        match node {
            TaskNode::Invoke { template_name, .. } => {
                let result = ctx.env.invoke(&template_name, &render_data).await;
                record_progress(&ctx, &session_id, &result).await;
                result
            }
            TaskNode::TaskRef { name, .. } => {
                let result = match ctx.task_registry.get(&name) {
                    Some(task) => task.run(render_data, &session_id).await,
                    None => Err(CoreError::Internal(format!("no task registered for task_ref {name:?}"))),
                };
                record_progress(&ctx, &session_id, &result).await;
                result
            }
            TaskNode::ChainCtx { .. } => Err(CoreError::Internal("ChainCtx only appears inside a Chain's steps".to_string())),
            TaskNode::Chain { steps } => {
                let mut chained_data = render_data;
                let mut last = String::new();
                for step in steps {
                    if let TaskNode::ChainCtx { .. } = step {
                        chain_ctx(&mut chained_data, &last);
                        record_progress(&ctx, &session_id, &Ok(last.clone())).await;
                        continue;
                    }
                    last = run_node(step, chained_data.clone(), ctx.clone(), session_id.clone()).await?;
                }
                Ok(last)
            }
            TaskNode::Group { branches, join, .. } => {
                let mut handles = Vec::with_capacity(branches.len());
                for branch in branches {
                    let ctx = ctx.clone();
                    let render_data = render_data.clone();
                    let session_id = session_id.clone();
                    handles.push(tokio::spawn(run_node(branch, render_data, ctx, session_id)));
                }
                let mut results = Vec::with_capacity(handles.len());
                for handle in handles {
                    results.push(handle.await.map_err(|e| CoreError::Internal(format!("branch task panicked: {e}")))??);
                }
                let joined = match join {
                    Join::Dict(keys) => combine_dict(&keys, &results),
                    Join::List => combine_list(&results),
                };
                record_progress(&ctx, &session_id, &Ok(joined.clone())).await;
                Ok(joined)
            }
            TaskNode::Map { list_path, idx_field, val_field, leaf_template, .. } => {
                let contexts = resolve_map_contexts(&render_data, &list_path, &idx_field, &val_field)
                    .ok_or_else(|| CoreError::TemplateError(format!("list_path {list_path:?} did not resolve to a list")))?;
                ctx.store.progress_grow_total(&session_id, contexts.len() as u64).await?;

                let mut handles = Vec::with_capacity(contexts.len());
                for element_context in contexts {
                    let ctx = ctx.clone();
                    let session_id = session_id.clone();
                    let leaf_template = leaf_template.clone();
                    handles.push(tokio::spawn(async move {
                        let result = ctx.env.invoke(&leaf_template, &element_context).await;
                        record_progress(&ctx, &session_id, &result).await;
                        result
                    }));
                }
                let mut results = Vec::with_capacity(handles.len());
                for handle in handles {
                    results.push(handle.await.map_err(|e| CoreError::Internal(format!("map element task panicked: {e}")))??);
                }
                let joined = combine_list(&results);
                record_progress(&ctx, &session_id, &Ok(joined.clone())).await;
                Ok(joined)
            }
        }
    })
}

/// Every task except `trigger_event`/`error_handler` is a progress-logging
/// task (spec §4.5): success increments `nr_subtasks_executed`, failure
/// tombstones the record so `error_handler` (which runs next) knows to
/// delete it rather than leave it stranded.
async fn record_progress(ctx: &WorkerCtx, session_id: &str, outcome: &Result<String, CoreError>) {
    let result = match outcome {
        Ok(_) => ctx.store.progress_increment_done(session_id).await,
        Err(err) => {
            tracing::warn!(session_id, %err, "worker task failed, tombstoning progress");
            ctx.store.progress_tombstone(session_id).await
        }
    };
    if let Err(store_err) = result {
        tracing::warn!(session_id, error = %store_err, "failed to update progress record");
    }
}

/// `trigger_event(previous_result, model_fqn, event_to_send_after, session_id)`
/// (spec §4.5): the task that closes out a successful DAG. Tolerates
/// `done > total` (spec §5) by deleting the progress record unconditionally
/// once it runs, rather than asserting the counters line up exactly.
async fn run_trigger_event(spec: &TriggerEventSpec, previous_result: &str, ctx: &Arc<WorkerCtx>) -> Result<(), CoreError> {
    let mut guard = SessionGuard::acquire(ctx.store.clone(), &spec.session_id).await?;

    if ctx.store.progress_status(&spec.session_id).await?.is_none() {
        tracing::warn!(session_id = %spec.session_id, "trigger_event ran with no progress record present");
    }
    ctx.store.progress_tombstone(&spec.session_id).await?;
    ctx.store.progress_increment_done(&spec.session_id).await?;
    ctx.store.progress_delete(&spec.session_id).await?;

    let def = ctx.flow_registry.get(&spec.flow_type_key)?;
    let sm = StateMachine::new(&def);
    let args = [Value::String(previous_result.to_string())];
    match sm.dispatch(&mut guard.model, &spec.event_to_send_after, &args, ctx.env.as_ref(), ctx.launcher.as_ref()).await {
        Ok(()) => guard.commit().await,
        Err(err) => {
            guard.discard().await?;
            Err(err)
        }
    }
}

/// `error_handler(request, exc, traceback, model_fqn, session_id, event_to_send_after)`
/// (spec §4.5): runs when any subtask of the DAG body fails. Records the
/// failure on the model and still drives the state machine forward (with an
/// empty first argument) so the flow does not get stuck waiting on a DAG
/// that will never finish.
async fn run_error_handler(spec: &ErrorHandlerSpec, task_error: &CoreError, ctx: &Arc<WorkerCtx>) -> Result<(), CoreError> {
    let mut guard = SessionGuard::acquire(ctx.store.clone(), &spec.session_id).await?;

    guard.model.append_task_error(serde_json::json!({
        "session_id": spec.session_id,
        "task_id": Uuid::new_v4().to_string(),
        "exception": task_error.to_string(),
    }));

    ctx.store.progress_delete(&spec.session_id).await?;

    let def = ctx.flow_registry.get(&spec.flow_type_key)?;
    let sm = StateMachine::new(&def);
    let args = [Value::String(String::new())];
    match sm.dispatch(&mut guard.model, &spec.event_to_send_after, &args, ctx.env.as_ref(), ctx.launcher.as_ref()).await {
        Ok(()) => guard.commit().await,
        Err(err) => {
            guard.discard().await?;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use genie_core::listener::DagLauncher;
    use genie_core::sm::FlowRegistry;
    use genie_core::template::Template;
    use genie_core::template_env::TemplateEnvironment;
    use genie_core::worker::{Join, TaskNode};
    use genie_persistence::InMemoryStore;

    use super::*;
    use crate::task_registry::TaskRegistry;

    struct StubEnv;

    #[async_trait]
    impl TemplateEnvironment for StubEnv {
        fn render(&self, name: &str, _context: &Value) -> Result<String, CoreError> {
            Err(CoreError::TemplateError(format!("render not expected for {name:?} in this test")))
        }

        async fn invoke(&self, name: &str, context: &Value) -> Result<String, CoreError> {
            match name {
                "double" => {
                    let n = context.get("n").and_then(Value::as_i64).unwrap_or(0);
                    Ok((n * 2).to_string())
                }
                "shout" => Ok(context.get("word").and_then(Value::as_str).unwrap_or("").to_uppercase()),
                other => Err(CoreError::TemplateError(format!("no invokable template named {other:?}"))),
            }
        }

        fn leaf_has_invoker(&self, _name: &str) -> bool {
            true
        }

        fn resolves(&self, name: &str) -> bool {
            matches!(name, "double" | "shout")
        }
    }

    struct UnusedLauncher;

    #[async_trait]
    impl DagLauncher for UnusedLauncher {
        async fn launch(&self, _template: &Template, _render_data: Value, _session_id: &str, _flow_type_key: &str, _event_to_send_after: &str) -> Result<(), CoreError> {
            panic!("no launch expected in these tests")
        }
    }

    fn test_ctx() -> Arc<WorkerCtx> {
        Arc::new(WorkerCtx {
            env: Arc::new(StubEnv),
            store: Arc::new(InMemoryStore::new()),
            flow_registry: Arc::new(FlowRegistry::new()),
            launcher: Arc::new(UnusedLauncher),
            task_registry: Arc::new(TaskRegistry::new()),
        })
    }

    #[tokio::test]
    async fn group_runs_branches_concurrently_and_joins_as_dict() {
        let ctx = test_ctx();
        let node = TaskNode::Group {
            id: "grp".to_string(),
            branches: vec![
                TaskNode::Invoke { id: "d".to_string(), template_name: "double".to_string() },
                TaskNode::Invoke { id: "s".to_string(), template_name: "shout".to_string() },
            ],
            join: Join::Dict(vec!["doubled".to_string(), "shouted".to_string()]),
        };
        let render_data = serde_json::json!({ "n": 21, "word": "hi" });
        let result = run_node(node, render_data, ctx.clone(), "sess-1".to_string()).await.unwrap();
        let parsed: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["doubled"], serde_json::json!(42));
        assert_eq!(parsed["shouted"], "HI");

        let progress = ctx.store.progress_status("sess-1").await.unwrap();
        assert!(progress.is_none(), "no progress record was ever started for this session, so nothing to find");
    }

    #[tokio::test]
    async fn chain_threads_previous_result_into_the_next_context() {
        let ctx = test_ctx();
        let node = TaskNode::Chain {
            steps: vec![
                TaskNode::Invoke { id: "d".to_string(), template_name: "double".to_string() },
                TaskNode::ChainCtx { id: "ctx".to_string() },
                TaskNode::Invoke { id: "s".to_string(), template_name: "shout".to_string() },
            ],
        };
        let render_data = serde_json::json!({ "n": 5, "word": "ignored" });
        let result = run_node(node, render_data, ctx, "sess-2".to_string()).await.unwrap();
        assert_eq!(result, "10");
    }

    #[tokio::test]
    async fn map_fans_out_over_a_list_and_joins_as_a_list() {
        let ctx = test_ctx();
        let node = TaskNode::Map {
            id: "m".to_string(),
            list_path: "words".to_string(),
            idx_field: "i".to_string(),
            val_field: "word".to_string(),
            leaf_template: "shout".to_string(),
        };
        ctx.store.progress_start("sess-3", "task-3", 1).await.unwrap();
        let render_data = serde_json::json!({ "words": ["a", "bee", "sea"] });
        let result = run_node(node, render_data, ctx.clone(), "sess-3".to_string()).await.unwrap();
        let parsed: Vec<String> = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed, vec!["A".to_string(), "BEE".to_string(), "SEA".to_string()]);

        let progress = ctx.store.progress_status("sess-3").await.unwrap().unwrap();
        assert_eq!(progress.total_nr_subtasks, 4);
        assert_eq!(progress.nr_subtasks_executed, 4);
    }

    #[tokio::test]
    async fn failed_invoke_tombstones_progress_instead_of_deleting_it() {
        let ctx = test_ctx();
        ctx.store.progress_start("sess-4", "task-4", 1).await.unwrap();
        let node = TaskNode::Invoke { id: "m".to_string(), template_name: "missing".to_string() };
        let err = run_node(node, serde_json::json!({}), ctx.clone(), "sess-4".to_string()).await;
        assert!(err.is_err());

        let progress = ctx.store.progress_status("sess-4").await.unwrap().unwrap();
        assert!(progress.tombstone, "a failed task must tombstone the record, not silently drop it");
    }

    struct TriggerEnv;

    #[async_trait]
    impl TemplateEnvironment for TriggerEnv {
        fn render(&self, name: &str, _context: &Value) -> Result<String, CoreError> {
            match name {
                "done_tpl" => Ok("done".to_string()),
                other => Err(CoreError::TemplateError(format!("no render template named {other:?}"))),
            }
        }

        async fn invoke(&self, name: &str, _context: &Value) -> Result<String, CoreError> {
            Err(CoreError::TemplateError(format!("no invokable template named {name:?}")))
        }

        fn leaf_has_invoker(&self, name: &str) -> bool {
            name == "go_tpl"
        }

        fn resolves(&self, name: &str) -> bool {
            matches!(name, "go_tpl" | "done_tpl")
        }
    }

    fn trigger_flow() -> genie_core::sm::FlowDefinition {
        use genie_core::sm::{StateDef, TransitionDef};
        genie_core::sm::FlowDefinition::new("trig")
            .with_state(StateDef::new("start", "start", Template::leaf("go_tpl")).initial())
            .with_state(StateDef::new("end", "end", Template::leaf("done_tpl")))
            .with_transition(TransitionDef::new("finish", "start", "end"))
    }

    /// `run_trigger_event` must not leak the `SessionGuard`'s lock when the
    /// progress record is already gone (e.g. a concurrent delete) — it should
    /// still reach `guard.commit()` rather than short-circuit on a missing
    /// record via `?`.
    #[tokio::test]
    async fn run_trigger_event_releases_lock_even_with_no_progress_record() {
        let env: Arc<dyn TemplateEnvironment> = Arc::new(TriggerEnv);
        let store = Arc::new(InMemoryStore::new());
        store.seed(genie_domain::SessionModel::new("sess-5", "trig", "start"));

        let mut registry = FlowRegistry::new();
        registry.register(trigger_flow(), env.as_ref()).unwrap();

        let ctx = Arc::new(WorkerCtx {
            env,
            store: store.clone(),
            flow_registry: Arc::new(registry),
            launcher: Arc::new(UnusedLauncher),
            task_registry: Arc::new(TaskRegistry::new()),
        });

        let spec = TriggerEventSpec { flow_type_key: "trig".to_string(), session_id: "sess-5".to_string(), event_to_send_after: "finish".to_string() };
        run_trigger_event(&spec, "some ai result", &ctx).await.unwrap();

        // If the guard's lock had leaked, a fresh acquire would time out instead.
        let handle = store.acquire_lock("sess-5").await.unwrap();
        store.release_lock(handle).await.unwrap();

        let model = store.load_model("sess-5").await.unwrap();
        assert_eq!(model.state, "end");
        assert!(store.progress_status("sess-5").await.unwrap().is_none());
    }
}
