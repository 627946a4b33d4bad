//! Ancestor-merge `meta.yaml` reading, ported from `GenieEnvironment
//! ._walk_directory_tree_upward` / `.read_meta` in
//! `examples/original_source/genie_flow/environment.py`: starting at the
//! template root and descending to a leaf directory, each directory's own
//! `meta.yaml` is shallow-merged over its parent's already-merged config, so
//! a child directory can override (but not remove) keys its ancestors set.

use std::collections::BTreeMap;
use std::path::Path;

use serde_yaml::Value;

const META_FILENAME: &str = "meta.yaml";

/// Reads and ancestor-merges `meta.yaml` from `root` down to `leaf`
/// (inclusive). `leaf` must be `root` or a descendant of it.
pub fn merged_config(root: &Path, leaf: &Path) -> Result<BTreeMap<String, Value>, crate::AdapterError> {
    let root = root.canonicalize().map_err(|e| crate::AdapterError::Io(root.display().to_string(), e.to_string()))?;
    let leaf = leaf.canonicalize().map_err(|e| crate::AdapterError::Io(leaf.display().to_string(), e.to_string()))?;

    let mut chain = vec![leaf.clone()];
    let mut current = leaf.clone();
    while current != root {
        let parent = current.parent().ok_or_else(|| {
            crate::AdapterError::NotUnderRoot(leaf.display().to_string(), root.display().to_string())
        })?;
        if parent == current {
            return Err(crate::AdapterError::NotUnderRoot(leaf.display().to_string(), root.display().to_string()));
        }
        chain.push(parent.to_path_buf());
        current = parent.to_path_buf();
    }
    chain.reverse(); // root first, leaf last

    let mut config = BTreeMap::new();
    for directory in chain {
        merge_one(&mut config, &directory)?;
    }
    Ok(config)
}

fn merge_one(config: &mut BTreeMap<String, Value>, directory: &Path) -> Result<(), crate::AdapterError> {
    let meta_path = directory.join(META_FILENAME);
    let raw = match std::fs::read_to_string(&meta_path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(directory = %directory.display(), "no meta.yaml found");
            return Ok(());
        }
        Err(error) => return Err(crate::AdapterError::Io(meta_path.display().to_string(), error.to_string())),
    };
    let meta: BTreeMap<String, Value> = serde_yaml::from_str(&raw)
        .map_err(|error| crate::AdapterError::Meta(meta_path.display().to_string(), error.to_string()))?;
    for (key, value) in meta {
        config.insert(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn child_overrides_parent_keys() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("meta.yaml"), "pool_size: 2\ninvoker:\n  type: verbatim\n").unwrap();
        let child = root.path().join("qa");
        fs::create_dir(&child).unwrap();
        fs::write(child.join("meta.yaml"), "pool_size: 5\n").unwrap();

        let config = merged_config(root.path(), &child).unwrap();
        assert_eq!(config.get("pool_size").unwrap().as_i64(), Some(5));
        assert!(config.contains_key("invoker"));
    }

    #[test]
    fn missing_meta_yaml_is_not_an_error() {
        let root = tempfile::tempdir().unwrap();
        let config = merged_config(root.path(), root.path()).unwrap();
        assert!(config.is_empty());
    }
}
