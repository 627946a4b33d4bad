//! End-to-end exercise of the Session Manager over a real worker pool:
//! `start_session` -> a USER->USER turn -> a USER->INVOKER turn that
//! launches a DAG -> polling until the worker pool's `trigger_event` lands
//! the INVOKER->USER continuation. Mirrors spec §8 scenario S1 ("simplest
//! Q&A loop") with a stub environment standing in for a real template
//! directory + invoker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use genie_core::errors::CoreError;
use genie_core::sm::{FlowDefinition, FlowRegistry, StateDef, TransitionDef};
use genie_core::template::Template;
use genie_core::template_env::TemplateEnvironment;
use genie_infra::{Engine, TaskRegistry};
use genie_persistence::InMemoryStore;

struct StubEnv;

#[async_trait]
impl TemplateEnvironment for StubEnv {
    fn render(&self, name: &str, context: &Value) -> Result<String, CoreError> {
        match name {
            "intro_tpl" => Ok("Hi, ask me something.".to_string()),
            "wait_tpl" => {
                let previous = context.get("parsed_previous_result").and_then(Value::as_str).unwrap_or("");
                Ok(format!("{previous} What else can I help with?"))
            }
            other => Err(CoreError::TemplateError(format!("no render template named {other:?} (context: {context})"))),
        }
    }

    async fn invoke(&self, name: &str, context: &Value) -> Result<String, CoreError> {
        match name {
            "respond_tpl" => {
                let question = context.get("model").and_then(|m| m.get("question")).and_then(Value::as_str).unwrap_or("");
                Ok(format!("answer to: {question}"))
            }
            other => Err(CoreError::TemplateError(format!("no invokable template named {other:?}"))),
        }
    }

    fn leaf_has_invoker(&self, name: &str) -> bool {
        name == "respond_tpl"
    }

    fn resolves(&self, name: &str) -> bool {
        matches!(name, "intro_tpl" | "wait_tpl" | "respond_tpl")
    }
}

fn qa_flow() -> FlowDefinition {
    FlowDefinition::new("qa")
        .with_state(StateDef::new("intro", "intro", Template::leaf("intro_tpl")).initial())
        .with_state(StateDef::new("wait", "wait_for_user", Template::leaf("wait_tpl")))
        .with_state(StateDef::new("answer", "ai_creates_response", Template::leaf("respond_tpl")))
        .with_transition(TransitionDef::new("user_input", "intro", "wait_for_user"))
        .with_transition(TransitionDef::new("user_input", "wait_for_user", "ai_creates_response"))
        .with_transition(TransitionDef::new("__poll_result__", "ai_creates_response", "wait_for_user"))
}

#[tokio::test]
async fn full_session_loop_reaches_ai_response_via_worker_pool() {
    let env = Arc::new(StubEnv);
    let store = Arc::new(InMemoryStore::new());
    let mut registry = FlowRegistry::new();
    registry.register(qa_flow(), env.as_ref()).unwrap();
    let registry = Arc::new(registry);

    let engine = Engine::new(registry, store, env, TaskRegistry::new(), 4);

    let start = engine.session_manager.start_session("qa").await.unwrap();
    assert_eq!(start.response.as_deref(), Some("Hi, ask me something."));
    assert_eq!(start.next_actions, vec!["user_input".to_string()]);
    let session_id = start.session_id;

    let turn1 = engine
        .session_manager
        .process_event("qa", &session_id, "user_input", Value::String("hello".to_string()))
        .await
        .unwrap();
    assert!(turn1.progress.is_none());
    assert_eq!(turn1.next_actions, vec!["user_input".to_string()]);

    let turn2 = engine
        .session_manager
        .process_event("qa", &session_id, "user_input", serde_json::json!({"question": "what is rust?"}))
        .await
        .unwrap();
    assert_eq!(turn2.next_actions, vec!["poll".to_string()]);

    let mut poll = engine.session_manager.process_event("qa", &session_id, "poll", Value::Null).await.unwrap();
    for _ in 0..50 {
        if poll.progress.is_none() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        poll = engine.session_manager.process_event("qa", &session_id, "poll", Value::Null).await.unwrap();
    }

    assert!(poll.progress.is_none(), "DAG never finished within the test's polling budget");
    assert_eq!(poll.response.as_deref(), Some("answer to: what is rust? What else can I help with?"));

    let status = engine.session_manager.get_task_state("qa", &session_id).await.unwrap();
    assert!(status.ready);
    assert_eq!(status.next_actions, vec!["user_input".to_string()]);
}
