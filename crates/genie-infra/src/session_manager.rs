//! The Session Manager (spec §4.1, component C7): the four public
//! operations every transport (`genie-cli`'s HTTP surface, the root demo)
//! calls through, ported from `examples/original_source/genie_flow/session.py::SessionManager`.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use genie_core::listener::DagLauncher;
use genie_core::sm::{FlowDefinition, FlowRegistry, StateMachine};
use genie_core::store::Store;
use genie_core::template_env::TemplateEnvironment;
use genie_core::{render::render_sync_text, CoreError};
use genie_domain::dialogue::{Actor, DialogueElement};
use genie_domain::SessionModel;
use genie_persistence::SessionGuard;

use crate::wire::{ProgressDto, Response, Status};

pub struct SessionManager {
    registry: Arc<FlowRegistry>,
    store: Arc<dyn Store>,
    env: Arc<dyn TemplateEnvironment>,
    launcher: Arc<dyn DagLauncher>,
}

impl SessionManager {
    pub fn new(registry: Arc<FlowRegistry>, store: Arc<dyn Store>, env: Arc<dyn TemplateEnvironment>, launcher: Arc<dyn DagLauncher>) -> Self {
        Self { registry, store, env, launcher }
    }

    /// `start_session(flow_type_key) -> Response` (spec §4.1): validates the
    /// flow key, instantiates a fresh model in its initial state, renders
    /// that state's template synchronously as the opening assistant turn,
    /// and persists under a freshly acquired lock.
    pub async fn start_session(&self, flow_type_key: &str) -> Result<Response, CoreError> {
        let def = self.registry.get(flow_type_key)?;
        let initial = def
            .initial_state()
            .ok_or_else(|| CoreError::Internal(format!("flow {flow_type_key:?} declares no initial state")))?;

        let session_id = Uuid::new_v4().to_string();
        let mut model = SessionModel::new(&session_id, flow_type_key, &initial.value);

        let context = serde_json::json!({ "session_id": session_id, "model": model.extraction });
        let text = render_sync_text(self.env.as_ref(), &initial.template, &context)?;
        model.push_dialogue(DialogueElement::new(Actor::Assistant, text.clone()));

        let lock = self.store.acquire_lock(&session_id).await?;
        self.store.persist_model(&model).await?;
        self.store.release_lock(lock).await?;

        Ok(Response {
            session_id,
            response: Some(text),
            error: None,
            next_actions: outgoing_events(&def, &initial.value),
            progress: None,
        })
    }

    /// `process_event(flow_type_key, {session_id, event, event_input}) -> Response`
    /// (spec §4.1): acquires the session lock, dispatches `poll` to
    /// `_handle_poll` or everything else to the state machine, and persists
    /// before releasing the lock either way.
    pub async fn process_event(&self, flow_type_key: &str, session_id: &str, event: &str, event_input: Value) -> Result<Response, CoreError> {
        let def = self.registry.get(flow_type_key)?;
        let guard = SessionGuard::acquire(self.store.clone(), session_id).await?;

        if event == "poll" {
            let response = self.handle_poll(&def, &guard.model).await?;
            guard.discard().await?;
            return Ok(response);
        }

        let mut guard = guard;
        let sm = StateMachine::new(&def);
        let args = [event_input];
        match sm.dispatch(&mut guard.model, event, &args, self.env.as_ref(), self.launcher.as_ref()).await {
            Ok(()) => {
                let response = if self.store.progress_status(session_id).await?.is_some() {
                    Response { session_id: session_id.to_string(), response: None, error: None, next_actions: vec!["poll".to_string()], progress: None }
                } else {
                    Response {
                        session_id: session_id.to_string(),
                        response: Some(guard.model.latest_assistant_text().unwrap_or_default().to_string()),
                        error: None,
                        next_actions: outgoing_events(&def, &guard.model.state),
                        progress: None,
                    }
                };
                guard.commit().await?;
                Ok(response)
            }
            Err(CoreError::TransitionNotAllowed { current_state, possible_events, received_event }) => {
                let response = Response {
                    session_id: session_id.to_string(),
                    response: None,
                    error: Some(
                        serde_json::json!({
                            "current_state": current_state,
                            "possible_events": possible_events.clone(),
                            "received_event": received_event,
                        })
                        .to_string(),
                    ),
                    next_actions: possible_events,
                    progress: None,
                };
                guard.discard().await?;
                Ok(response)
            }
            Err(other) => {
                guard.discard().await?;
                Err(other)
            }
        }
    }

    /// `get_task_state(flow_type_key, session_id) -> Status` (spec §4.1):
    /// `ready=false` while a progress record exists, else the current
    /// state's outgoing events.
    pub async fn get_task_state(&self, flow_type_key: &str, session_id: &str) -> Result<Status, CoreError> {
        let def = self.registry.get(flow_type_key)?;
        let guard = SessionGuard::acquire(self.store.clone(), session_id).await?;
        let status = if self.store.progress_status(session_id).await?.is_some() {
            Status { session_id: session_id.to_string(), ready: false, next_actions: vec![] }
        } else {
            Status { session_id: session_id.to_string(), ready: true, next_actions: outgoing_events(&def, &guard.model.state) }
        };
        guard.discard().await?;
        Ok(status)
    }

    /// `get_model(flow_type_key, session_id) -> Model`: load-under-lock,
    /// returned verbatim.
    pub async fn get_model(&self, _flow_type_key: &str, session_id: &str) -> Result<SessionModel, CoreError> {
        let guard = SessionGuard::acquire(self.store.clone(), session_id).await?;
        let model = guard.model.clone();
        guard.discard().await?;
        Ok(model)
    }

    /// `_handle_poll` (spec §4.1): progress in flight wins over everything
    /// else; otherwise a recorded task error; otherwise the latest assistant
    /// turn (or an empty string if somehow none exists yet).
    async fn handle_poll(&self, def: &FlowDefinition, model: &SessionModel) -> Result<Response, CoreError> {
        if let Some(progress) = self.store.progress_status(&model.session_id).await? {
            return Ok(Response {
                session_id: model.session_id.clone(),
                response: None,
                error: None,
                next_actions: vec!["poll".to_string()],
                progress: Some(ProgressDto {
                    total_number_of_subtasks: progress.total_nr_subtasks,
                    number_of_subtasks_executed: progress.nr_subtasks_executed,
                }),
            });
        }

        if let Some(task_error) = &model.task_error {
            return Ok(Response {
                session_id: model.session_id.clone(),
                response: None,
                error: Some(task_error.to_string()),
                next_actions: outgoing_events(def, &model.state),
                progress: None,
            });
        }

        Ok(Response {
            session_id: model.session_id.clone(),
            response: Some(model.latest_assistant_text().unwrap_or_default().to_string()),
            error: None,
            next_actions: outgoing_events(def, &model.state),
            progress: None,
        })
    }
}

/// The events a state's outgoing transitions declare, in declaration order
/// with duplicates removed (a state may offer the same event under several
/// mutually-exclusive guards).
fn outgoing_events(def: &FlowDefinition, state_value: &str) -> Vec<String> {
    let mut events: Vec<String> = def.transitions.iter().filter(|t| t.source == state_value).map(|t| t.event.clone()).collect();
    events.dedup();
    events
}
