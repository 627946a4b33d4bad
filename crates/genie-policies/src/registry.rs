//! String-keyed guard/hook registries, so a flow definition built from
//! configuration (rather than hand-assembled Rust closures) can look up
//! `"user_says_stop"` or `"capture:user_name"` by name — the policy-side
//! counterpart of the teacher's id-keyed `PropertySelectionPolicy` registry.

use std::collections::HashMap;
use std::sync::Arc;

use genie_core::sm::{Guard, Hook};

use crate::guards;
use crate::hooks::{noop, CaptureActorInputAsField, MergeActorInputJsonIntoExtraction};

#[derive(Default)]
pub struct GuardRegistry {
    guards: HashMap<String, Arc<dyn Guard>>,
}

impl GuardRegistry {
    /// A registry pre-populated with the built-in guards in [`crate::guards`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.insert("always", guards::always);
        registry.insert("user_says_stop", guards::user_says_stop);
        registry.insert("user_wants_to_quit", guards::user_wants_to_quit);
        registry.insert("name_is_defined", guards::name_is_defined);
        registry
    }

    pub fn insert(&mut self, name: impl Into<String>, guard: impl Guard + 'static) {
        self.guards.insert(name.into(), Arc::new(guard));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Guard>> {
        self.guards.get(name).cloned()
    }
}

#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Arc<dyn Hook>>,
}

impl HookRegistry {
    /// A registry pre-populated with the stateless built-in hooks. Hooks
    /// that need a parameter (like [`CaptureActorInputAsField`]'s target
    /// field) are registered per-flow via [`HookRegistry::insert`] instead.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.insert("noop", noop);
        registry.insert("merge_actor_input_json", MergeActorInputJsonIntoExtraction);
        registry
    }

    pub fn insert(&mut self, name: impl Into<String>, hook: impl Hook + 'static) {
        self.hooks.insert(name.into(), Arc::new(hook));
    }

    pub fn capture_field(&mut self, name: impl Into<String>, field: impl Into<String>) {
        self.insert(name, CaptureActorInputAsField::new(field));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Hook>> {
        self.hooks.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genie_domain::SessionModel;

    #[test]
    fn builtin_guards_resolve_by_name() {
        let registry = GuardRegistry::with_builtins();
        let guard = registry.get("user_says_stop").unwrap();
        let model = SessionModel::new("s1", "qa", "intro");
        assert!(guard.check(&[serde_json::Value::String("*STOP*".to_string())], &model));
        assert!(registry.get("does_not_exist").is_none());
    }

    #[test]
    fn capture_field_hook_registers_under_given_name() {
        let mut registry = HookRegistry::with_builtins();
        registry.capture_field("capture:user_name", "user_name");
        let hook = registry.get("capture:user_name").unwrap();
        let mut model = SessionModel::new("s1", "qa", "ai_extracts_name");
        model.actor_input = "Ada".to_string();
        hook.call(&mut model, &[]);
        assert_eq!(model.extraction.get("user_name").and_then(|v| v.as_str()), Some("Ada"));
    }
}
