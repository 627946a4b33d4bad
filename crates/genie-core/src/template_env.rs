//! The template environment contract (spec §4.3, component C3).
//!
//! Resolves a leaf name to either a renderable Jinja-style template or an
//! invocable one, honours `meta.yaml` ancestor-merge inheritance, and
//! classifies leaves as USER- or INVOKER-typed for the state machine (spec
//! §4.2 dialogue persistence table). `genie-adapters` supplies the concrete
//! minijinja-backed implementation; everything in `genie-core` only depends
//! on this trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;
use crate::template::Template;

#[async_trait]
pub trait TemplateEnvironment: Send + Sync {
    /// Renders `name` against `context` using this environment's Jinja-style
    /// rules (variable interpolation, `meta.yaml`-inherited defaults merged
    /// under `context`).
    fn render(&self, name: &str, context: &Value) -> Result<String, CoreError>;

    /// Invokes `name` against `context`: renders it, then calls whatever
    /// invoker is registered for its name prefix.
    async fn invoke(&self, name: &str, context: &Value) -> Result<String, CoreError>;

    /// True when `name` resolves to an invoker rather than a plain render.
    fn leaf_has_invoker(&self, name: &str) -> bool;

    /// True when `name` names a registered template at all (render-only or
    /// invoker-backed). Used at flow registration time (spec §4.2: "every
    /// leaf template name resolves in the Template Environment").
    fn resolves(&self, name: &str) -> bool;

    /// A state's template is USER-typed exactly when none of its leaves
    /// resolve to an invoker (spec §4.2): every leaf is a pure render with no
    /// outbound call, so the state machine waits on a human `EventInput`
    /// rather than driving itself forward with `trigger_event`.
    fn has_invoker(&self, template: &Template) -> bool {
        template.leaf_names().into_iter().any(|name| self.leaf_has_invoker(name))
    }
}
