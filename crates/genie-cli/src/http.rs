//! The HTTP surface (spec §6): thin Axum routes in front of `genie_infra::Engine`'s
//! `SessionManager`, grounded in `examples/original_source/ai_state_machine/app.py`'s
//! `GenieFlowRouterBuilder` (same four routes, same `{prefix}/{flow_type_key}/...`
//! shape) with one deliberate divergence: the original raises a 500 whenever
//! `Response.error` is set, but spec §4.1 calls `TransitionNotAllowed` a
//! structured error, "not a 5xx" — so a populated `Response.error` field is
//! just a normal 200 here, and only a propagated `CoreError` becomes a 404/500.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::routing::{get, post};
use axum::{Json, Router};

use genie_core::errors::CoreError;
use genie_infra::{Engine, EventInput, Response, Status};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub debug: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/:flow_type_key/start_session", get(start_session))
        .route("/:flow_type_key/event", post(event))
        .route("/:flow_type_key/task_state/:session_id", get(task_state))
        .route("/:flow_type_key/model/:session_id", get(model))
        .with_state(state)
}

/// Wraps a propagated `CoreError` for `IntoResponse`; a `Response` whose
/// `error` field is set never reaches this type (spec-driven 200, see above).
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn from_core(err: CoreError, debug: bool) -> Self {
        let status = match err {
            CoreError::UnknownFlow(_) | CoreError::UnknownSession(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = if debug || status == StatusCode::NOT_FOUND { err.to_string() } else { "internal error".to_string() };
        Self { status, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> AxumResponse {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

async fn start_session(State(state): State<AppState>, Path(flow_type_key): Path<String>) -> Result<Json<Response>, AppError> {
    state
        .engine
        .session_manager
        .start_session(&flow_type_key)
        .await
        .map(Json)
        .map_err(|e| AppError::from_core(e, state.debug))
}

async fn event(
    State(state): State<AppState>,
    Path(flow_type_key): Path<String>,
    Json(input): Json<EventInput>,
) -> Result<Json<Response>, AppError> {
    state
        .engine
        .session_manager
        .process_event(&flow_type_key, &input.session_id, &input.event, input.event_input)
        .await
        .map(Json)
        .map_err(|e| AppError::from_core(e, state.debug))
}

async fn task_state(
    State(state): State<AppState>,
    Path((flow_type_key, session_id)): Path<(String, String)>,
) -> Result<Json<Status>, AppError> {
    state
        .engine
        .session_manager
        .get_task_state(&flow_type_key, &session_id)
        .await
        .map(Json)
        .map_err(|e| AppError::from_core(e, state.debug))
}

async fn model(
    State(state): State<AppState>,
    Path((flow_type_key, session_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = state
        .engine
        .session_manager
        .get_model(&flow_type_key, &session_id)
        .await
        .map_err(|e| AppError::from_core(e, state.debug))?;
    serde_json::to_value(model).map(Json).map_err(|e| AppError::from_core(CoreError::Internal(e.to_string()), state.debug))
}
