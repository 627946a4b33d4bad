//! genie-server: the HTTP binary wiring the whole engine together
//! (spec §9's "explicit Engine handle a binary owns"): builds a
//! `GenieTemplateEnvironment` against `GENIE_TEMPLATE_ROOT`, a `Store`
//! (in-memory or Redis, per `GENIE_STORE_BACKEND`), registers the example
//! flow, and serves spec §6's HTTP surface over it.

mod config;
mod flows;
mod http;

use std::sync::Arc;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use genie_adapters::GenieTemplateEnvironment;
use genie_core::sm::FlowRegistry;
use genie_core::store::Store;
use genie_core::template_env::TemplateEnvironment;
use genie_infra::{Engine, TaskRegistry};
use genie_persistence::{InMemoryStore, RedisStore};

use crate::config::GenieAppConfig;
use crate::http::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = GenieAppConfig::from_env();
    init_logging();

    let env = Arc::new(GenieTemplateEnvironment::new(app_config.template_root.clone(), app_config.default_pool_size));
    env.register_all(&app_config.template_root)?;
    let env: Arc<dyn TemplateEnvironment> = env;

    let mut registry = FlowRegistry::new();
    registry.register(flows::q_and_a_capture_flow(), env.as_ref())?;
    let registry = Arc::new(registry);

    let store: Arc<dyn Store> = if app_config.store_backend.eq_ignore_ascii_case("redis") {
        tracing::info!("connecting to Redis");
        Arc::new(RedisStore::connect(app_config.redis.clone()).await?)
    } else {
        tracing::info!("using in-memory store (set GENIE_STORE_BACKEND=redis for a persistent store)");
        Arc::new(InMemoryStore::new())
    };

    let engine = Arc::new(Engine::new(registry, store, env, TaskRegistry::new(), app_config.worker_count));

    let state = AppState { engine, debug: app_config.debug };
    let router = http::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    tracing::info!(addr = %app_config.bind_addr, "starting genie-server");
    let listener = tokio::net::TcpListener::bind(app_config.bind_addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async { tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).try_init();
}
