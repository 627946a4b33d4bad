//! State Machine Runtime (spec §4.2, component C6): flow definitions,
//! guards, hooks, and the dispatch loop. A `FlowDefinition` is registered
//! once per `flow_type_key`; a `StateMachine` is instantiated fresh for
//! every event dispatch and bound to whatever `SessionModel` is currently
//! loaded — the model's `state` field is the only persistent cursor (spec
//! §4.2 "ephemeral ... bound to the currently-loaded model").

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use genie_domain::SessionModel;

use crate::errors::CoreError;
use crate::listener::{DagLauncher, TransitionListener};
use crate::template::Template;
use crate::template_env::TemplateEnvironment;

/// Whether a state's template requires invocation (spec §3 invariants,
/// §Glossary "USER state / INVOKER state").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    User,
    Invoker,
}

impl StateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKind::User => "user",
            StateKind::Invoker => "invoker",
        }
    }
}

pub struct StateDef {
    pub id: String,
    pub value: String,
    pub initial: bool,
    pub is_final: bool,
    pub template: Template,
}

impl StateDef {
    pub fn new(id: impl Into<String>, value: impl Into<String>, template: Template) -> Self {
        Self { id: id.into(), value: value.into(), initial: false, is_final: false, template }
    }

    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// A pure predicate over the incoming event's arguments and the current
/// model (spec §4.2: "Guards are pure functions of `(event_data, model)`;
/// they must be side-effect-free").
pub trait Guard: Send + Sync {
    fn check(&self, args: &[Value], model: &SessionModel) -> bool;
}

impl<F> Guard for F
where
    F: Fn(&[Value], &SessionModel) -> bool + Send + Sync,
{
    fn check(&self, args: &[Value], model: &SessionModel) -> bool {
        self(args, model)
    }
}

/// An entry/exit/event hook that may mutate `model` (spec §4.2: "Exit/entry
/// hooks may mutate model, e.g. parse JSON from actor_input into typed fields").
pub trait Hook: Send + Sync {
    fn call(&self, model: &mut SessionModel, args: &[Value]);
}

impl<F> Hook for F
where
    F: Fn(&mut SessionModel, &[Value]) + Send + Sync,
{
    fn call(&self, model: &mut SessionModel, args: &[Value]) {
        self(model, args)
    }
}

pub struct TransitionDef {
    pub event: String,
    pub source: String,
    pub target: String,
    pub guard: Option<Arc<dyn Guard>>,
}

impl TransitionDef {
    pub fn new(event: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { event: event.into(), source: source.into(), target: target.into(), guard: None }
    }

    pub fn guarded(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// Static, one-per-`flow_type_key` registration (spec §3 "Flow definition").
#[derive(Default)]
pub struct FlowDefinition {
    pub flow_type_key: String,
    pub states: Vec<StateDef>,
    pub transitions: Vec<TransitionDef>,
    pub before_transition: Option<Arc<dyn Hook>>,
    pub on_event: HashMap<String, Arc<dyn Hook>>,
    pub on_exit_state: HashMap<String, Arc<dyn Hook>>,
    pub on_enter_state: HashMap<String, Arc<dyn Hook>>,
}

impl FlowDefinition {
    pub fn new(flow_type_key: impl Into<String>) -> Self {
        Self { flow_type_key: flow_type_key.into(), ..Default::default() }
    }

    pub fn with_state(mut self, state: StateDef) -> Self {
        self.states.push(state);
        self
    }

    pub fn with_transition(mut self, transition: TransitionDef) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_before_transition(mut self, hook: Arc<dyn Hook>) -> Self {
        self.before_transition = Some(hook);
        self
    }

    pub fn on_event(mut self, event: impl Into<String>, hook: Arc<dyn Hook>) -> Self {
        self.on_event.insert(event.into(), hook);
        self
    }

    pub fn on_exit(mut self, state_value: impl Into<String>, hook: Arc<dyn Hook>) -> Self {
        self.on_exit_state.insert(state_value.into(), hook);
        self
    }

    pub fn on_enter(mut self, state_value: impl Into<String>, hook: Arc<dyn Hook>) -> Self {
        self.on_enter_state.insert(state_value.into(), hook);
        self
    }

    pub fn state(&self, value: &str) -> Option<&StateDef> {
        self.states.iter().find(|s| s.value == value)
    }

    pub fn initial_state(&self) -> Option<&StateDef> {
        self.states.iter().find(|s| s.initial)
    }

    fn transitions_from(&self, source: &str) -> impl Iterator<Item = &TransitionDef> {
        self.transitions.iter().filter(move |t| t.source == source)
    }

    /// Validation at flow registration time (spec §4.2): every leaf template
    /// name resolves in the environment, and state `value`s are unique.
    /// Every declared state carrying a `Template` is enforced by the type
    /// system (`StateDef::template` is not optional).
    fn validate(&self, env: &dyn TemplateEnvironment) -> Result<(), CoreError> {
        let mut seen = std::collections::HashSet::new();
        for state in &self.states {
            if !seen.insert(state.value.as_str()) {
                return Err(CoreError::Internal(format!(
                    "flow {:?}: duplicate state value {:?}",
                    self.flow_type_key, state.value
                )));
            }
            for leaf in state.template.leaf_names() {
                if !env.resolves(leaf) {
                    return Err(CoreError::TemplateError(format!(
                        "flow {:?}: state {:?} references unresolved template {:?}",
                        self.flow_type_key, state.value, leaf
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Static registry of flow definitions, keyed by `flow_type_key` (spec §4.1
/// "validates key exists in the registry").
#[derive(Default)]
pub struct FlowRegistry {
    flows: HashMap<String, Arc<FlowDefinition>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: FlowDefinition, env: &dyn TemplateEnvironment) -> Result<(), CoreError> {
        def.validate(env)?;
        self.flows.insert(def.flow_type_key.clone(), Arc::new(def));
        Ok(())
    }

    pub fn get(&self, flow_type_key: &str) -> Result<Arc<FlowDefinition>, CoreError> {
        self.flows.get(flow_type_key).cloned().ok_or_else(|| CoreError::UnknownFlow(flow_type_key.to_string()))
    }
}

/// The ephemeral dispatch driver (spec §4.2). Holds no state of its own
/// beyond the flow definition reference; every dispatch call is independent.
pub struct StateMachine<'a> {
    def: &'a FlowDefinition,
}

impl<'a> StateMachine<'a> {
    pub fn new(def: &'a FlowDefinition) -> Self {
        Self { def }
    }

    fn classify(&self, state_value: &str, env: &dyn TemplateEnvironment) -> Result<StateKind, CoreError> {
        let state = self.def.state(state_value).ok_or_else(|| CoreError::Internal(format!("unknown state {state_value:?}")))?;
        Ok(if env.has_invoker(&state.template) { StateKind::Invoker } else { StateKind::User })
    }

    /// Dispatches `event` against `model`, mutating it in place and driving
    /// side effects (dialogue append, DAG launch) through `listener_env`/
    /// `launcher`. Returns `CoreError::TransitionNotAllowed` without
    /// mutating `model` if no transition's guard is satisfied.
    pub async fn dispatch(
        &self,
        model: &mut SessionModel,
        event: &str,
        args: &[Value],
        env: &dyn TemplateEnvironment,
        launcher: &dyn DagLauncher,
    ) -> Result<(), CoreError> {
        let candidates: Vec<&TransitionDef> = self.def.transitions_from(&model.state).filter(|t| t.event == event).collect();
        let chosen = candidates.iter().find(|t| t.guard.as_ref().map(|g| g.check(args, model)).unwrap_or(true));

        let Some(transition) = chosen else {
            let possible_events: Vec<String> = {
                let mut events: Vec<String> = self.def.transitions_from(&model.state).map(|t| t.event.clone()).collect();
                events.dedup();
                events
            };
            tracing::debug!(session_id = %model.session_id, state = %model.state, event, "transition not allowed");
            return Err(CoreError::TransitionNotAllowed {
                current_state: model.state.clone(),
                possible_events,
                received_event: event.to_string(),
            });
        };

        let source = transition.source.clone();
        let target = transition.target.clone();
        tracing::info!(session_id = %model.session_id, event, %source, %target, "dispatching transition");

        // before_transition: classify, set actor/actor_input, run the global hook.
        let source_kind = self.classify(&source, env)?;
        let target_kind = self.classify(&target, env)?;
        model.actor = Some(target_kind.as_str().to_string());
        model.actor_input = args.first().map(render_arg_as_text).unwrap_or_default();
        if let Some(hook) = &self.def.before_transition {
            hook.call(model, args);
        }

        // on_exit_<source> / on_<event>, then the state mutation itself.
        if let Some(hook) = self.def.on_exit_state.get(&source) {
            hook.call(model, args);
        }
        if let Some(hook) = self.def.on_event.get(event) {
            hook.call(model, args);
        }
        model.state = target.clone();
        if let Some(hook) = self.def.on_enter_state.get(&target) {
            hook.call(model, args);
        }

        // on_transition + after_transition (dialogue persistence): owned by
        // the Transition Listener (spec §4.8), which also knows how to
        // launch a DAG for an INVOKER target.
        let raw_actor_input = model.actor_input.clone();
        let listener = TransitionListener::new(env, launcher);
        listener.handle(self.def, model, source_kind, target_kind, &target, raw_actor_input).await
    }
}

fn render_arg_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreError;
    use crate::listener::DagLauncher;
    use async_trait::async_trait;
    use genie_domain::dialogue::Actor;
    use std::sync::Mutex;

    struct StubEnv {
        invoker_leaves: Vec<&'static str>,
    }

    #[async_trait]
    impl TemplateEnvironment for StubEnv {
        fn render(&self, name: &str, _context: &Value) -> Result<String, CoreError> {
            Ok(format!("rendered:{name}"))
        }
        async fn invoke(&self, name: &str, _context: &Value) -> Result<String, CoreError> {
            Ok(format!("invoked:{name}"))
        }
        fn leaf_has_invoker(&self, name: &str) -> bool {
            self.invoker_leaves.contains(&name)
        }
        fn resolves(&self, _name: &str) -> bool {
            true
        }
    }

    struct StubLauncher {
        launched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DagLauncher for StubLauncher {
        async fn launch(&self, _template: &Template, _render_data: Value, session_id: &str, _flow_type_key: &str, _event_to_send_after: &str) -> Result<(), CoreError> {
            self.launched.lock().unwrap().push(session_id.to_string());
            Ok(())
        }
    }

    fn qa_flow() -> FlowDefinition {
        FlowDefinition::new("qa")
            .with_state(StateDef::new("intro", "intro", Template::leaf("intro_tpl")).initial())
            .with_state(StateDef::new("wait", "wait_for_user", Template::leaf("noop")))
            .with_state(StateDef::new("answer", "ai_creates_response", Template::leaf("verbatim_tpl")))
            .with_transition(TransitionDef::new("user_input", "intro", "wait_for_user"))
            .with_transition(TransitionDef::new("user_input", "wait_for_user", "ai_creates_response"))
            .with_transition(TransitionDef::new("user_input", "ai_creates_response", "wait_for_user"))
    }

    #[tokio::test]
    async fn user_to_user_appends_raw_actor_input() {
        let env = StubEnv { invoker_leaves: vec![] };
        let launcher = StubLauncher { launched: Mutex::new(vec![]) };
        let def = qa_flow();
        let sm = StateMachine::new(&def);
        let mut model = SessionModel::new("s1", "qa", "intro");

        sm.dispatch(&mut model, "user_input", &[Value::String("hello".into())], &env, &launcher).await.unwrap();

        assert_eq!(model.state, "wait_for_user");
        assert_eq!(model.dialogue.len(), 1);
        assert_eq!(model.dialogue[0].actor, Actor::User);
        assert_eq!(model.dialogue[0].text, "hello");
    }

    #[tokio::test]
    async fn invoker_to_user_renders_target_assistant_text() {
        let env = StubEnv { invoker_leaves: vec!["noop"] };
        let launcher = StubLauncher { launched: Mutex::new(vec![]) };
        let def = qa_flow();
        let sm = StateMachine::new(&def);
        let mut model = SessionModel::new("s1", "qa", "wait_for_user");
        model.state = "ai_creates_response".to_string();

        sm.dispatch(&mut model, "user_input", &[], &env, &launcher).await.unwrap();

        assert_eq!(model.state, "wait_for_user");
        assert_eq!(model.dialogue.len(), 1);
        assert_eq!(model.dialogue[0].actor, Actor::Assistant);
        assert_eq!(model.dialogue[0].text, "rendered:noop");
    }

    #[tokio::test]
    async fn unmatched_event_reports_transition_not_allowed() {
        let env = StubEnv { invoker_leaves: vec![] };
        let launcher = StubLauncher { launched: Mutex::new(vec![]) };
        let def = qa_flow();
        let sm = StateMachine::new(&def);
        let mut model = SessionModel::new("s1", "qa", "intro");

        let err = sm.dispatch(&mut model, "advance", &[], &env, &launcher).await.unwrap_err();
        match err {
            CoreError::TransitionNotAllowed { current_state, possible_events, received_event } => {
                assert_eq!(current_state, "intro");
                assert_eq!(possible_events, vec!["user_input".to_string()]);
                assert_eq!(received_event, "advance");
            }
            other => panic!("expected TransitionNotAllowed, got {other:?}"),
        }
        assert_eq!(model.state, "intro");
    }
}
