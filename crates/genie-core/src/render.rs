//! Synchronous template rendering shared by the Transition Listener (for
//! INVOKER→USER turns, spec §4.2) and the Session Manager (for a freshly
//! started session's initial state, spec §4.1): a USER-typed template has no
//! invoker leaves, so it can be rendered to its final text without going
//! through the worker runtime at all.

use serde_json::Value;

use crate::errors::CoreError;
use crate::template::{Content, Template};
use crate::template_env::TemplateEnvironment;
use crate::worker::{chain_ctx, resolve_map_contexts};

/// Renders `template` synchronously against `context`, collapsing the result
/// to plain text (JSON-encoding any non-text `Content` produced along the
/// way). Only reachable for USER-typed templates — a `TaskRef` leaf has no
/// synchronous rendering and errors instead.
pub fn render_sync_text(env: &dyn TemplateEnvironment, template: &Template, context: &Value) -> Result<String, CoreError> {
    let content = render_sync_content(env, template, context)?;
    Ok(match content.as_text() {
        Some(text) => text.to_string(),
        None => content.to_json().to_string(),
    })
}

pub fn render_sync_content(env: &dyn TemplateEnvironment, template: &Template, context: &Value) -> Result<Content, CoreError> {
    match template {
        Template::Leaf(name) => Ok(Content::Text(env.render(name, context)?)),
        Template::TaskRef(name) => Err(CoreError::TemplateError(format!(
            "task_ref {name:?} cannot be synchronously rendered as a USER-typed template"
        ))),
        Template::Sequence(children) => {
            let mut ctx = context.clone();
            let mut last = Content::Text(String::new());
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    let prev_text = match &last {
                        Content::Text(s) => s.clone(),
                        other => other.to_json().to_string(),
                    };
                    chain_ctx(&mut ctx, &prev_text);
                }
                last = render_sync_content(env, child, &ctx)?;
            }
            Ok(last)
        }
        Template::Parallel(branches) => {
            let mut map = std::collections::BTreeMap::new();
            for (key, child) in branches {
                map.insert(key.clone(), render_sync_content(env, child, context)?);
            }
            Ok(Content::Map(map))
        }
        Template::MapOver { list_path, idx_field, val_field, leaf } => {
            let leaf_name = match leaf.as_ref() {
                Template::Leaf(name) => name,
                other => return Err(CoreError::TemplateError(format!("MapOver leaf must be a Leaf template, got {other:?}"))),
            };
            let contexts = resolve_map_contexts(context, list_path, idx_field, val_field)
                .ok_or_else(|| CoreError::TemplateError(format!("list_path {list_path:?} did not resolve to a list")))?;
            let mut items = Vec::with_capacity(contexts.len());
            for ctx in &contexts {
                items.push(Content::Text(env.render(leaf_name, ctx)?));
            }
            Ok(Content::List(items))
        }
    }
}
