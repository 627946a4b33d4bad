//! Reusable transition guards (spec §4.2: "pure functions of `(event_data,
//! model)`"), ported from the `cond="..."`/`unless="..."` predicate methods
//! attached to the teacher's sibling `GenieStateMachine` subclasses in
//! `examples/original_source/example_qa/q_and_a_capture.py` and
//! `q_and_a_cond.py`.

use serde_json::Value;

use genie_domain::SessionModel;

const STOP_TOKEN: &str = "*STOP*";
const UNDEFINED_TOKEN: &str = "UNDEFINED";

fn first_arg_as_str(args: &[Value]) -> Option<&str> {
    args.first().and_then(Value::as_str)
}

/// Ported from `user_says_stop`: true when the first event argument is
/// exactly the stop token.
pub fn user_says_stop(args: &[Value], _model: &SessionModel) -> bool {
    first_arg_as_str(args) == Some(STOP_TOKEN)
}

/// Ported from `user_wants_to_quit`: true when the first event argument
/// *contains* the stop token, not just equals it.
pub fn user_wants_to_quit(args: &[Value], _model: &SessionModel) -> bool {
    first_arg_as_str(args).map(|s| s.contains(STOP_TOKEN)).unwrap_or(false)
}

/// Ported from `name_is_defined`: true when the first event argument is
/// present and not the sentinel "UNDEFINED" value an extraction invoker
/// returns when it found nothing.
pub fn name_is_defined(args: &[Value], _model: &SessionModel) -> bool {
    first_arg_as_str(args).map(|s| s != UNDEFINED_TOKEN).unwrap_or(false)
}

/// A guard that always allows the transition; used for the single
/// unconditional branch out of a state that otherwise only has guarded
/// alternatives, so that `StateMachine::dispatch`'s first-match semantics
/// can still pick a default.
pub fn always(_args: &[Value], _model: &SessionModel) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SessionModel {
        SessionModel::new("s1", "qa", "intro")
    }

    #[test]
    fn user_says_stop_requires_exact_match() {
        let m = model();
        assert!(user_says_stop(&[Value::String(STOP_TOKEN.to_string())], &m));
        assert!(!user_says_stop(&[Value::String("please *STOP* now".to_string())], &m));
        assert!(!user_says_stop(&[], &m));
    }

    #[test]
    fn user_wants_to_quit_matches_substring() {
        let m = model();
        assert!(user_wants_to_quit(&[Value::String("please *STOP* now".to_string())], &m));
        assert!(!user_wants_to_quit(&[Value::String("keep going".to_string())], &m));
    }

    #[test]
    fn name_is_defined_rejects_sentinel() {
        let m = model();
        assert!(name_is_defined(&[Value::String("Ada".to_string())], &m));
        assert!(!name_is_defined(&[Value::String(UNDEFINED_TOKEN.to_string())], &m));
        assert!(!name_is_defined(&[], &m));
    }
}
