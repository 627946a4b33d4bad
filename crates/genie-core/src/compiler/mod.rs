//! Task Graph Compiler (spec §4.4, component C4): translates a composite
//! `Template` into a `CompiledDag` of `TaskNode`s. Pure and deterministic —
//! same template + render data always compiles to the same topology and
//! subtask count (spec §8 property 5), the same way `chem-core`'s
//! `StepDefinition::run` never reaches for I/O the engine doesn't hand it.

use serde_json::Value;
use uuid::Uuid;

use crate::template::Template;
use crate::worker::{CompiledDag, ErrorHandlerSpec, Join, TaskNode, TriggerEventSpec};

pub struct TaskGraphCompiler;

impl TaskGraphCompiler {
    pub fn new() -> Self {
        TaskGraphCompiler
    }

    /// Compiles `template` into a full `CompiledDag`, including the root
    /// wrap with `trigger_event` and the curried `error_handler` (spec §4.4
    /// final paragraph).
    pub fn compile(
        &self,
        template: &Template,
        render_data: Value,
        session_id: &str,
        flow_type_key: &str,
        event_to_send_after: &str,
    ) -> CompiledDag {
        let (root, body_count) = Self::compile_node(template);
        CompiledDag {
            root,
            render_data,
            trigger_event: TriggerEventSpec {
                flow_type_key: flow_type_key.to_string(),
                session_id: session_id.to_string(),
                event_to_send_after: event_to_send_after.to_string(),
            },
            error_handler: ErrorHandlerSpec {
                flow_type_key: flow_type_key.to_string(),
                session_id: session_id.to_string(),
                event_to_send_after: event_to_send_after.to_string(),
            },
            // +1 for the trigger_event task itself, per spec §4.4.
            subtask_count: body_count + 1,
        }
    }

    /// Compiles one `Template` node, returning it alongside its compile-time
    /// subtask count (not counting any `Map` node's runtime fan-out).
    fn compile_node(template: &Template) -> (TaskNode, u64) {
        match template {
            Template::Leaf(name) => (TaskNode::Invoke { id: new_id(), template_name: name.clone() }, 1),
            Template::TaskRef(name) => (TaskNode::TaskRef { id: new_id(), name: name.clone() }, 1),
            Template::Sequence(children) => Self::compile_sequence(children),
            Template::Parallel(branches) => Self::compile_parallel(branches),
            Template::MapOver { list_path, idx_field, val_field, leaf } => {
                let leaf_template = match leaf.as_ref() {
                    Template::Leaf(name) => name.clone(),
                    other => panic!("MapOver leaf must be a Leaf template, got {other:?}"),
                };
                (
                    TaskNode::Map {
                        id: new_id(),
                        list_path: list_path.clone(),
                        idx_field: idx_field.clone(),
                        val_field: val_field.clone(),
                        leaf_template,
                    },
                    1,
                )
            }
        }
    }

    /// `Sequence [t1,…,tn]`: `compile(t1) | chain_ctx | compile(t2) | … | compile(tn)`,
    /// `+n−1` `chain_ctx` subtasks (spec §4.4 rule 3).
    fn compile_sequence(children: &[Template]) -> (TaskNode, u64) {
        let mut steps = Vec::with_capacity(children.len() * 2 - 1);
        let mut count = 0u64;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                steps.push(TaskNode::ChainCtx { id: new_id() });
                count += 1;
            }
            let (node, node_count) = Self::compile_node(child);
            steps.push(node);
            count += node_count;
        }
        (TaskNode::Chain { steps }, count)
    }

    /// `Parallel {k1:t1,…}` (keys in insertion order): chord joined by
    /// `combine_dict(keys, …)`, `+1` subtask (spec §4.4 rule 4).
    fn compile_parallel(branches: &[(String, Template)]) -> (TaskNode, u64) {
        let mut keys = Vec::with_capacity(branches.len());
        let mut compiled = Vec::with_capacity(branches.len());
        let mut count = 1u64; // the combine_dict join itself
        for (key, template) in branches {
            keys.push(key.clone());
            let (node, node_count) = Self::compile_node(template);
            compiled.push(node);
            count += node_count;
        }
        (TaskNode::Group { id: new_id(), branches: compiled, join: Join::Dict(keys) }, count)
    }
}

impl Default for TaskGraphCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_compiles_to_single_invoke_with_trigger() {
        let compiler = TaskGraphCompiler::new();
        let dag = compiler.compile(&Template::leaf("greet"), json!({}), "s1", "qa", "ai_done");
        assert!(matches!(dag.root, TaskNode::Invoke { .. }));
        assert_eq!(dag.subtask_count, 2); // invoke + trigger_event
    }

    #[test]
    fn parallel_group_counts_leaves_plus_join_plus_trigger() {
        // Matches spec §8 scenario S3: N = 1 (ingredients) + 1 (benefits) + 1 (combine) + 1 (trigger) = 4.
        let compiler = TaskGraphCompiler::new();
        let template = Template::Parallel(vec![
            ("ingredients".into(), Template::leaf("r_i")),
            ("benefits".into(), Template::leaf("r_b")),
        ]);
        let dag = compiler.compile(&template, json!({}), "s1", "qa", "ai_done");
        assert_eq!(dag.subtask_count, 4);
        match dag.root {
            TaskNode::Group { join: Join::Dict(keys), branches, .. } => {
                assert_eq!(keys, vec!["ingredients".to_string(), "benefits".to_string()]);
                assert_eq!(branches.len(), 2);
            }
            other => panic!("expected a Group node, got {other:?}"),
        }
    }

    #[test]
    fn sequence_inserts_chain_ctx_between_children() {
        let compiler = TaskGraphCompiler::new();
        let template = Template::Sequence(vec![Template::leaf("a"), Template::leaf("b"), Template::leaf("c")]);
        let dag = compiler.compile(&template, json!({}), "s1", "qa", "ai_done");
        // 3 leaves + 2 chain_ctx + 1 trigger_event.
        assert_eq!(dag.subtask_count, 6);
        match dag.root {
            TaskNode::Chain { steps } => assert_eq!(steps.len(), 5),
            other => panic!("expected a Chain node, got {other:?}"),
        }
    }

    #[test]
    fn map_over_counts_one_placeholder_at_compile_time() {
        let compiler = TaskGraphCompiler::new();
        let template = Template::map_over("items", "idx", "val", Template::leaf("per_item"));
        let dag = compiler.compile(&template, json!({}), "s1", "qa", "ai_done");
        assert_eq!(dag.subtask_count, 2); // map placeholder + trigger_event; fan-out counted at runtime
        assert!(matches!(dag.root, TaskNode::Map { .. }));
    }
}
