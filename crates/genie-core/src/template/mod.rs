//! The composite template expression language (spec §3, §4.4).
//!
//! A `Template` is attached to every flow state and describes how to render
//! (or invoke) the content for that state at dispatch time. It compiles 1:1
//! into a task DAG via `crate::compiler::TaskGraphCompiler`; the shapes here
//! stay structural and neutral, the same way `chem-core::model::Artifact`
//! keeps its `payload` as opaque JSON and leaves interpretation to callers.

use serde_json::Value;

/// A composite template expression. Five variants, matching spec §3 exactly:
/// a leaf renders or invokes directly, a task-ref names an already-compiled
/// subtree, and `Sequence`/`Parallel`/`MapOver` combine children.
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// Names a renderable/invokable template by its registered name.
    Leaf(String),
    /// Names another flow's compiled task graph to splice in verbatim.
    TaskRef(String),
    /// Children run strictly in order; the result chains forward via
    /// `chain_ctx` (spec §4.5).
    Sequence(Vec<Template>),
    /// Children run concurrently; results combine back into one value.
    /// Insertion order is preserved because `combine_dict`/`combine_list`
    /// need a deterministic join order (spec §4.4 rule 3/4).
    Parallel(Vec<(String, Template)>),
    /// Expands one leaf once per element of a list found at `list_path` in
    /// the render context; `idx_field`/`val_field` name where the per-element
    /// index and value land in each expansion's render context.
    MapOver {
        list_path: String,
        idx_field: String,
        val_field: String,
        leaf: Box<Template>,
    },
}

impl Template {
    pub fn leaf(name: impl Into<String>) -> Self {
        Template::Leaf(name.into())
    }

    pub fn task_ref(name: impl Into<String>) -> Self {
        Template::TaskRef(name.into())
    }

    pub fn map_over(list_path: impl Into<String>, idx_field: impl Into<String>, val_field: impl Into<String>, leaf: Template) -> Self {
        Template::MapOver {
            list_path: list_path.into(),
            idx_field: idx_field.into(),
            val_field: val_field.into(),
            leaf: Box::new(leaf),
        }
    }

    /// Collects every `Leaf` name reachable from this template, depth-first.
    /// `TaskRef` and `MapOver` leaves are included too: the environment needs
    /// to know about every name that might be rendered or invoked, whether
    /// it is nested directly or reached only after a `map` expansion.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaf_names(&mut out);
        out
    }

    fn collect_leaf_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Template::Leaf(name) => out.push(name.as_str()),
            Template::TaskRef(name) => out.push(name.as_str()),
            Template::Sequence(children) => {
                for child in children {
                    child.collect_leaf_names(out);
                }
            }
            Template::Parallel(branches) => {
                for (_, child) in branches {
                    child.collect_leaf_names(out);
                }
            }
            Template::MapOver { leaf, .. } => leaf.collect_leaf_names(out),
        }
    }
}

/// The neutral value shape threaded through `chain_ctx`/`combine_dict`/
/// `combine_list` (spec §3): a leaf's raw string result, or a list/map of
/// further `Content` once combined. Kept isomorphic to `serde_json::Value`
/// so worker task helpers can convert freely without a bespoke codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    List(Vec<Content>),
    Map(std::collections::BTreeMap<String, Content>),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Parses `s` as JSON when possible, otherwise leaves it as opaque text.
    /// Mirrors the leaf-result handling in spec §4.5's `combine_dict`/
    /// `combine_list`: an invoker's raw string result is opportunistically
    /// treated as structured JSON, but a plain-text invoker result (e.g. an
    /// LLM completion) is just as valid as a leaf value.
    pub fn from_invoker_result(s: &str) -> Self {
        match serde_json::from_str::<Value>(s) {
            Ok(value) => Content::from_json(&value),
            Err(_) => Content::Text(s.to_string()),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => Content::Text(s.clone()),
            Value::Array(items) => Content::List(items.iter().map(Content::from_json).collect()),
            Value::Object(map) => {
                Content::Map(map.iter().map(|(k, v)| (k.clone(), Content::from_json(v))).collect())
            }
            other => Content::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Content::Text(s) => serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone())),
            Content::List(items) => Value::Array(items.iter().map(Content::to_json).collect()),
            Content::Map(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_names_walks_nested_composites() {
        let tpl = Template::Sequence(vec![
            Template::leaf("greet"),
            Template::Parallel(vec![
                ("a".into(), Template::leaf("fetch_a")),
                ("b".into(), Template::task_ref("sub_flow")),
            ]),
            Template::map_over("items", "idx", "val", Template::leaf("per_item")),
        ]);
        assert_eq!(tpl.leaf_names(), vec!["greet", "fetch_a", "sub_flow", "per_item"]);
    }

    #[test]
    fn content_round_trips_json_result() {
        let c = Content::from_invoker_result(r#"{"score": 1, "tags": ["a", "b"]}"#);
        assert!(matches!(c, Content::Map(_)));
        assert_eq!(c.to_json(), serde_json::json!({"score": 1, "tags": ["a", "b"]}));
    }

    #[test]
    fn content_keeps_plain_text_as_text() {
        let c = Content::from_invoker_result("hello there");
        assert_eq!(c.as_text(), Some("hello there"));
    }
}
