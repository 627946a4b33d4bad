//! The same `q_and_a_capture` flow `genie-cli` registers, duplicated here
//! rather than pulled in as a library dependency — a standalone demo binary
//! and a server binary legitimately own separate copies of their own small
//! fixture flow. See `crates/genie-cli/src/flows.rs` for the from-scratch
//! grounding notes (ported from
//! `examples/original_source/example_qa/q_and_a_capture.py`).

use std::sync::Arc;

use genie_core::sm::{FlowDefinition, StateDef, TransitionDef};
use genie_core::template::Template;
use genie_policies::{GuardRegistry, HookRegistry};

pub const FLOW_TYPE_KEY: &str = "q_and_a_capture";

pub fn q_and_a_capture_flow() -> FlowDefinition {
    let guards = GuardRegistry::with_builtins();
    let mut hooks = HookRegistry::with_builtins();
    hooks.capture_field("capture:user_name", "user_name");
    hooks.capture_field("capture:raw_message", "raw_message");
    hooks.capture_field("capture:query", "query");

    let user_says_stop = guards.get("user_says_stop").expect("registered by with_builtins");
    let user_wants_to_quit = guards.get("user_wants_to_quit").expect("registered by with_builtins");
    let name_is_defined = guards.get("name_is_defined").expect("registered by with_builtins");
    let always: Arc<dyn genie_core::sm::Guard> = guards.get("always").expect("registered by with_builtins");

    FlowDefinition::new(FLOW_TYPE_KEY)
        .with_state(StateDef::new("intro", "intro", Template::leaf("q_and_a/intro.jinja2")).initial())
        .with_state(StateDef::new("ai_extracts_name", "ai_extracts_name", Template::leaf("q_and_a_ai/ai_name_extraction.jinja2")))
        .with_state(StateDef::new("need_to_retry", "need_to_retry", Template::leaf("q_and_a/request_for_name_retry.jinja2")))
        .with_state(StateDef::new("welcome_message", "welcome_message", Template::leaf("q_and_a/welcome.jinja2")))
        .with_state(StateDef::new("user_enters_query", "user_enters_query", Template::leaf("q_and_a/user_input.jinja2")))
        .with_state(StateDef::new("ai_creates_response", "ai_creates_response", Template::leaf("q_and_a_ai/ai_response.jinja2")))
        .with_state(StateDef::new("outro", "outro", Template::leaf("q_and_a/outro.jinja2")).terminal())
        .with_transition(TransitionDef::new("user_input", "intro", "ai_extracts_name"))
        .with_transition(TransitionDef::new("user_input", "need_to_retry", "ai_extracts_name"))
        .with_transition(TransitionDef::new("user_input", "welcome_message", "ai_creates_response"))
        .with_transition(TransitionDef::new("user_input", "user_enters_query", "outro").guarded(user_says_stop))
        .with_transition(TransitionDef::new("user_input", "user_enters_query", "ai_creates_response").guarded(always.clone()))
        .with_transition(TransitionDef::new("__poll_result__", "ai_extracts_name", "welcome_message").guarded(name_is_defined))
        .with_transition(TransitionDef::new("__poll_result__", "ai_extracts_name", "need_to_retry").guarded(always.clone()))
        .with_transition(TransitionDef::new("__poll_result__", "ai_creates_response", "outro").guarded(user_wants_to_quit))
        .with_transition(TransitionDef::new("__poll_result__", "ai_creates_response", "user_enters_query").guarded(always))
        .on_enter("ai_extracts_name", hooks.get("capture:raw_message").expect("just registered"))
        .on_enter("ai_creates_response", hooks.get("capture:query").expect("just registered"))
        .on_exit("ai_extracts_name", hooks.get("capture:user_name").expect("just registered"))
}
