//! Transition Listener (spec §4.8, component C8): one instance per
//! state-machine dispatch, bridging the SM to the Task Compiler + Worker
//! Runtime + progress tracking. `StateMachine::dispatch` (in `crate::sm`)
//! builds one of these after it has already resolved the transition, set
//! `actor`/`actor_input`, and run the flow's own hooks; this module owns
//! exactly the two things spec §4.8 assigns to it: the dialogue-persistence
//! decision and launching a DAG for an INVOKER target.

use async_trait::async_trait;
use serde_json::Value;

use genie_domain::dialogue::{Actor, DialogueElement};
use genie_domain::SessionModel;

use crate::errors::CoreError;
use crate::render::render_sync_text;
use crate::sm::{FlowDefinition, StateKind};
use crate::template::Template;
use crate::template_env::TemplateEnvironment;

/// The worker-runtime entry point a `TransitionListener` calls for INVOKER
/// targets: compile the target's template into a DAG, enqueue it, and start
/// its progress record (spec §4.8 "calls TaskCompiler.compile(...) then
/// enqueues via the Worker Runtime and calls Store.progress.start(...)").
/// `genie-infra` supplies the concrete implementation wiring
/// `TaskGraphCompiler` + its `TaskQueue` + `Store` together; `genie-core`
/// only depends on this contract.
#[async_trait]
pub trait DagLauncher: Send + Sync {
    async fn launch(
        &self,
        template: &Template,
        render_data: Value,
        session_id: &str,
        flow_type_key: &str,
        event_to_send_after: &str,
    ) -> Result<(), CoreError>;
}

pub struct TransitionListener<'a> {
    env: &'a dyn TemplateEnvironment,
    launcher: &'a dyn DagLauncher,
}

impl<'a> TransitionListener<'a> {
    pub fn new(env: &'a dyn TemplateEnvironment, launcher: &'a dyn DagLauncher) -> Self {
        Self { env, launcher }
    }

    /// Runs the `on_transition` + `after_transition` portion of spec §4.2/§4.8
    /// once the SM has already committed `model.state = target`.
    pub async fn handle(
        &self,
        def: &FlowDefinition,
        model: &mut SessionModel,
        source_kind: StateKind,
        target_kind: StateKind,
        target: &str,
        raw_actor_input: String,
    ) -> Result<(), CoreError> {
        // on_transition: INVOKER targets compile+enqueue+progress.start; dialogue is untouched here.
        if target_kind == StateKind::Invoker {
            let target_state = def.state(target).ok_or_else(|| CoreError::Internal(format!("unknown state {target:?}")))?;
            let render_data = serde_json::json!({ "session_id": model.session_id, "model": model.extraction });
            self.launcher
                .launch(&target_state.template, render_data, &model.session_id, &def.flow_type_key, "__poll_result__")
                .await?;
        }

        // after_transition: dialogue persistence table (spec §4.2).
        match (source_kind, target_kind) {
            (StateKind::User, StateKind::User) | (StateKind::User, StateKind::Invoker) => {
                model.push_dialogue(DialogueElement::new(Actor::User, raw_actor_input));
            }
            (StateKind::Invoker, StateKind::User) => {
                let target_state = def.state(target).ok_or_else(|| CoreError::Internal(format!("unknown state {target:?}")))?;
                let parsed_previous_result = crate::worker::parse_if_json(&raw_actor_input);
                let context = serde_json::json!({ "model": model.extraction, "parsed_previous_result": parsed_previous_result });
                let text = render_sync_text(self.env, &target_state.template, &context)?;
                model.push_dialogue(DialogueElement::new(Actor::Assistant, text));
            }
            (StateKind::Invoker, StateKind::Invoker) => {}
        }

        Ok(())
    }
}
