//! The closed worker task set (spec §4.5, component C5) and the pure logic
//! each task kind needs. `genie-core` only owns the *shapes* and the
//! deterministic helpers (`chain_ctx`, `combine_dict`, `combine_list`,
//! `parse_if_json`, `parse_json_deep`); the I/O-bound parts of `invoke`,
//! `trigger_event`, and `error_handler` (calling the template environment,
//! taking the session lock, persisting) are executed by `genie-infra`'s
//! worker pool against the `TemplateEnvironment`/`Store` contracts this
//! crate defines.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node of a compiled DAG (spec §4.4's compilation output). Mirrors the
/// teacher's `typed_artifact!`/`typed_step!`-registered steps in spirit: a
/// DAG carries only names + data, never closures (spec §9 "Global module
/// state ... Worker tasks are registered by string name").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TaskNode {
    /// `invoke(render_data, template_name, session_id)`.
    Invoke { id: String, template_name: String },
    /// An opaque reference to another flow's already-compiled subtree.
    TaskRef { id: String, name: String },
    /// `chain_ctx(prev_result, render_data, session_id)`; threads the
    /// previous step's result into the next step's render data.
    ChainCtx { id: String },
    /// A fan-out group joined by `combine_dict`/`combine_list`.
    Group { id: String, branches: Vec<TaskNode>, join: Join },
    /// `map(render_data, list_path, idx_field, val_field, template_name, session_id)`;
    /// resolved into per-element `Invoke` nodes (joined by `combine_list`) at
    /// runtime, once `list_path` is available (spec §4.4 rule 5).
    Map {
        id: String,
        list_path: String,
        idx_field: String,
        val_field: String,
        leaf_template: String,
    },
    /// A linear chain of steps, `chain_ctx`-threaded between each pair.
    Chain { steps: Vec<TaskNode> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Join {
    /// Results are joined into `{keys[i]: results[i]}` by `combine_dict`.
    Dict(Vec<String>),
    /// Results are joined into a list by `combine_list` (used for the
    /// runtime expansion of a `Map` node).
    List,
}

/// Currying for the task that closes a DAG once its compiled body resolves
/// (spec §4.4: "root is wrapped: `compile(T) | trigger_event(...)`").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerEventSpec {
    pub flow_type_key: String,
    pub session_id: String,
    pub event_to_send_after: String,
}

/// Currying for the error path attached to the DAG root (spec §4.4: "The
/// error handler is attached to the root signature (not to leaves)").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorHandlerSpec {
    pub flow_type_key: String,
    pub session_id: String,
    pub event_to_send_after: String,
}

/// The full compiled output of `TaskGraphCompiler::compile` (spec §4.4): a
/// root node, the currying for its success and failure continuations, and
/// the subtask count known at compile time (a `Map` node's runtime fan-out
/// is not included; `Store::progress_grow_total` accounts for it later).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompiledDag {
    pub root: TaskNode,
    pub render_data: Value,
    pub trigger_event: TriggerEventSpec,
    pub error_handler: ErrorHandlerSpec,
    pub subtask_count: u64,
}

/// Parses `s` as JSON when possible, otherwise returns it as a string
/// (spec §4.5 `combine_dict`/`combine_list`: `parse_if_json`).
pub fn parse_if_json(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

/// Recursively parses embedded JSON strings found while walking `s` (spec
/// §4.5 `chain_ctx`: "strings parsed if JSON, lists/maps recursed, else
/// passthrough"). Only `s` itself and strings nested inside the JSON it
/// parses to are considered; a string is never parsed more than once.
pub fn parse_json_deep(s: &str) -> Value {
    match serde_json::from_str::<Value>(s) {
        Ok(value) => deep_parse_nested_strings(value),
        Err(_) => Value::String(s.to_string()),
    }
}

fn deep_parse_nested_strings(value: Value) -> Value {
    match value {
        Value::String(inner) => parse_if_json(&inner),
        Value::Array(items) => Value::Array(items.into_iter().map(deep_parse_nested_strings).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, deep_parse_nested_strings(v))).collect()),
        other => other,
    }
}

/// `chain_ctx(prev_result, render_data, session_id)`: mutates `render_data`
/// in place, setting `previous_result` and `parsed_previous_result`.
pub fn chain_ctx(render_data: &mut Value, prev_result: &str) {
    let obj = match render_data {
        Value::Object(map) => map,
        other => {
            *other = Value::Object(serde_json::Map::new());
            other.as_object_mut().expect("just assigned an object")
        }
    };
    obj.insert("previous_result".to_string(), Value::String(prev_result.to_string()));
    obj.insert("parsed_previous_result".to_string(), parse_json_deep(prev_result));
}

/// `combine_dict(results, keys, session_id)`: builds `{keys[i]: parse_if_json(results[i])}`.
pub fn combine_dict(keys: &[String], results: &[String]) -> String {
    let map: serde_json::Map<String, Value> = keys
        .iter()
        .zip(results.iter())
        .map(|(k, r)| (k.clone(), parse_if_json(r)))
        .collect();
    serde_json::to_string(&Value::Object(map)).expect("serializing a JSON map cannot fail")
}

/// `combine_list(results, session_id)`: emits `json(parse_if_json_each(results))`.
pub fn combine_list(results: &[String]) -> String {
    let arr: Vec<Value> = results.iter().map(|r| parse_if_json(r)).collect();
    serde_json::to_string(&Value::Array(arr)).expect("serializing a JSON array cannot fail")
}

/// Resolves a `Map` node's `list_path` against its render data into the
/// per-element render contexts the runtime expands into (spec §4.4 rule 5,
/// §4.5 `map`): one context per element, each carrying `idx_field`/`val_field`.
pub fn resolve_map_contexts(render_data: &Value, list_path: &str, idx_field: &str, val_field: &str) -> Option<Vec<Value>> {
    let list = lookup_path(render_data, list_path)?;
    let items = list.as_array()?;
    Some(
        items
            .iter()
            .enumerate()
            .map(|(idx, val)| {
                let mut ctx = render_data.as_object().cloned().unwrap_or_default();
                ctx.insert(idx_field.to_string(), Value::from(idx as u64));
                ctx.insert(val_field.to_string(), val.clone());
                Value::Object(ctx)
            })
            .collect(),
    )
}

/// Dotted-path lookup (`"a.b.c"`) used to resolve `MapOver`'s `list_path`
/// against the render-data snapshot.
fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |cur, segment| cur.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_ctx_parses_nested_json_result() {
        let mut ctx = json!({"greeting": "hi"});
        chain_ctx(&mut ctx, r#"{"x":1}"#);
        assert_eq!(ctx["previous_result"], json!(r#"{"x":1}"#));
        assert_eq!(ctx["parsed_previous_result"], json!({"x": 1}));
    }

    #[test]
    fn chain_ctx_leaves_plain_text_unparsed() {
        let mut ctx = json!({});
        chain_ctx(&mut ctx, "just text");
        assert_eq!(ctx["parsed_previous_result"], json!("just text"));
    }

    #[test]
    fn combine_dict_respects_declared_key_order_and_parses_json_members() {
        let keys = vec!["ingredients".to_string(), "benefits".to_string()];
        let results = vec![r#"["aloe"]"#.to_string(), "moisturizing".to_string()];
        let joined = combine_dict(&keys, &results);
        let value: Value = serde_json::from_str(&joined).unwrap();
        assert_eq!(value, json!({"ingredients": ["aloe"], "benefits": "moisturizing"}));
    }

    #[test]
    fn combine_list_parses_each_member_independently() {
        let results = vec!["1".to_string(), "not json".to_string()];
        let joined = combine_list(&results);
        let value: Value = serde_json::from_str(&joined).unwrap();
        assert_eq!(value, json!([1, "not json"]));
    }

    #[test]
    fn resolve_map_contexts_carries_idx_and_val() {
        let data = json!({"items": ["a", "b"]});
        let contexts = resolve_map_contexts(&data, "items", "idx", "val").unwrap();
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[1]["idx"], json!(1));
        assert_eq!(contexts[1]["val"], json!("b"));
    }
}
