//! genie-demo: a standalone, single-process walkthrough of the `q_and_a_capture`
//! flow (same one `genie-cli` serves over HTTP) against an in-memory store,
//! exercising the engine end to end without needing Redis or a running
//! server — `start_session`, a name-capture turn, a question turn, and the
//! polling loop each one launches, printed as a transcript.

mod flows;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use genie_adapters::GenieTemplateEnvironment;
use genie_core::sm::FlowRegistry;
use genie_core::store::Store;
use genie_core::template_env::TemplateEnvironment;
use genie_infra::{Engine, TaskRegistry};
use genie_persistence::InMemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).try_init();

    let template_root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
    let env = Arc::new(GenieTemplateEnvironment::new(template_root.clone(), 4));
    env.register_all(&template_root)?;
    let env: Arc<dyn TemplateEnvironment> = env;

    let mut registry = FlowRegistry::new();
    registry.register(flows::q_and_a_capture_flow(), env.as_ref())?;
    let registry = Arc::new(registry);

    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let engine = Engine::new(registry, store, env, TaskRegistry::new(), 4);

    let start = engine.session_manager.start_session(flows::FLOW_TYPE_KEY).await?;
    println!("assistant: {}", start.response.unwrap_or_default());
    let session_id = start.session_id;

    println!("user: Ada");
    let turn = engine
        .session_manager
        .process_event(flows::FLOW_TYPE_KEY, &session_id, "user_input", serde_json::Value::String("Ada".to_string()))
        .await?;
    let turn = poll_until_done(&engine, &session_id, turn).await?;
    println!("assistant: {}", turn.response.unwrap_or_default());

    println!("user: what is the airspeed velocity of an unladen swallow?");
    let turn = engine
        .session_manager
        .process_event(
            flows::FLOW_TYPE_KEY,
            &session_id,
            "user_input",
            serde_json::Value::String("what is the airspeed velocity of an unladen swallow?".to_string()),
        )
        .await?;
    let turn = poll_until_done(&engine, &session_id, turn).await?;
    println!("assistant: {}", turn.response.unwrap_or_default());

    println!("user: *STOP*");
    let turn = engine
        .session_manager
        .process_event(flows::FLOW_TYPE_KEY, &session_id, "user_input", serde_json::Value::String("*STOP*".to_string()))
        .await?;
    println!("assistant: {}", turn.response.unwrap_or_default());

    Ok(())
}

async fn poll_until_done(
    engine: &Engine,
    session_id: &str,
    mut turn: genie_infra::Response,
) -> anyhow::Result<genie_infra::Response> {
    while turn.next_actions.first().map(String::as_str) == Some("poll") {
        tokio::time::sleep(Duration::from_millis(10)).await;
        turn = engine.session_manager.process_event(flows::FLOW_TYPE_KEY, session_id, "poll", serde_json::Value::Null).await?;
    }
    Ok(turn)
}
