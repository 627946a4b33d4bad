//! The example flow this binary registers at startup: a Rust port of
//! `examples/original_source/example_qa/q_and_a_capture.py`'s
//! `QandACaptureMachine` — the richest of the four Q&A variants in the
//! original (name capture + a retry loop + a stop-word exit), used here to
//! exercise every corner of the State Machine Runtime the plainer Q&A
//! variants don't: guarded multi-way transitions, a terminal state, and a
//! hook-driven typed field.

use std::sync::Arc;

use genie_core::sm::{FlowDefinition, StateDef, TransitionDef};
use genie_core::template::Template;
use genie_policies::{GuardRegistry, HookRegistry};

pub const FLOW_TYPE_KEY: &str = "q_and_a_capture";

/// Builds the flow definition (expects the `q_and_a/*.jinja2` templates
/// registered under the `q_and_a` prefix; `FlowRegistry::register` validates
/// that against the live `TemplateEnvironment`).
pub fn q_and_a_capture_flow() -> FlowDefinition {
    let guards = GuardRegistry::with_builtins();
    let mut hooks = HookRegistry::with_builtins();
    hooks.capture_field("capture:user_name", "user_name");
    // `render_data` for an INVOKER state is built from `model.extraction`
    // right after `on_enter_<state>` runs (spec §4.2 before_transition /
    // on_transition ordering), so the raw text the invoker needs to see has
    // to be copied there on entry rather than read off `actor_input`
    // directly — `actor_input` itself never reaches the render context.
    hooks.capture_field("capture:raw_message", "raw_message");
    hooks.capture_field("capture:query", "query");

    let user_says_stop = guards.get("user_says_stop").expect("registered by with_builtins");
    let user_wants_to_quit = guards.get("user_wants_to_quit").expect("registered by with_builtins");
    let name_is_defined = guards.get("name_is_defined").expect("registered by with_builtins");
    let always: Arc<dyn genie_core::sm::Guard> = guards.get("always").expect("registered by with_builtins");

    // USER-typed leaves live under the `q_and_a` prefix (no invoker in its
    // `meta.yaml`); INVOKER-typed leaves live under the sibling `q_and_a_ai`
    // prefix (whose `meta.yaml` declares a `verbatim` invoker pool) — whether
    // a leaf has an invoker is a property of its registered *directory*, per
    // `GenieTemplateEnvironment::leaf_has_invoker`, so the two kinds cannot
    // share one prefix.
    let def = FlowDefinition::new(FLOW_TYPE_KEY)
        .with_state(StateDef::new("intro", "intro", Template::leaf("q_and_a/intro.jinja2")).initial())
        .with_state(StateDef::new("ai_extracts_name", "ai_extracts_name", Template::leaf("q_and_a_ai/ai_name_extraction.jinja2")))
        .with_state(StateDef::new("need_to_retry", "need_to_retry", Template::leaf("q_and_a/request_for_name_retry.jinja2")))
        .with_state(StateDef::new("welcome_message", "welcome_message", Template::leaf("q_and_a/welcome.jinja2")))
        .with_state(StateDef::new("user_enters_query", "user_enters_query", Template::leaf("q_and_a/user_input.jinja2")))
        .with_state(StateDef::new("ai_creates_response", "ai_creates_response", Template::leaf("q_and_a_ai/ai_response.jinja2")))
        .with_state(StateDef::new("outro", "outro", Template::leaf("q_and_a/outro.jinja2")).terminal())
        // user_input: USER-typed states hand control to the next INVOKER state.
        .with_transition(TransitionDef::new("user_input", "intro", "ai_extracts_name"))
        .with_transition(TransitionDef::new("user_input", "need_to_retry", "ai_extracts_name"))
        .with_transition(TransitionDef::new("user_input", "welcome_message", "ai_creates_response"))
        .with_transition(TransitionDef::new("user_input", "user_enters_query", "outro").guarded(user_says_stop))
        .with_transition(TransitionDef::new("user_input", "user_enters_query", "ai_creates_response").guarded(always.clone()))
        // __poll_result__: the DAG's trigger_event continuation out of an INVOKER state.
        .with_transition(TransitionDef::new("__poll_result__", "ai_extracts_name", "welcome_message").guarded(name_is_defined))
        .with_transition(TransitionDef::new("__poll_result__", "ai_extracts_name", "need_to_retry").guarded(always.clone()))
        .with_transition(TransitionDef::new("__poll_result__", "ai_creates_response", "outro").guarded(user_wants_to_quit))
        .with_transition(TransitionDef::new("__poll_result__", "ai_creates_response", "user_enters_query").guarded(always))
        .on_enter("ai_extracts_name", hooks.get("capture:raw_message").expect("just registered"))
        .on_enter("ai_creates_response", hooks.get("capture:query").expect("just registered"))
        .on_exit("ai_extracts_name", hooks.get("capture:user_name").expect("just registered"));

    def
}
