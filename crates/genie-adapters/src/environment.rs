//! The concrete `TemplateEnvironment` (spec §4.3, component C3), ported from
//! `GenieEnvironment` in `examples/original_source/genie_flow/environment.py`:
//! a `PrefixLoader`-style registry of template directories, each carrying
//! its own ancestor-merged `meta.yaml` and (optionally) an invoker pool, with
//! a minijinja `Environment` resolving `"{prefix}/{relative_path}"` names
//! against them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use genie_core::template_env::TemplateEnvironment;
use genie_core::CoreError;

use crate::errors::AdapterError;
use crate::meta;
use crate::pool::InvokerBag;
use crate::registry::TemplateDirectory;

pub struct GenieTemplateEnvironment {
    template_root: PathBuf,
    default_pool_size: usize,
    directories: Arc<RwLock<HashMap<String, Arc<TemplateDirectory>>>>,
}

impl GenieTemplateEnvironment {
    pub fn new(template_root: impl Into<PathBuf>, default_pool_size: usize) -> Self {
        Self {
            template_root: template_root.into(),
            default_pool_size,
            directories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a single prefix against `directory`, reading and
    /// ancestor-merging its `meta.yaml` chain and building its invoker pool
    /// (if its merged config has an `invoker` block).
    pub fn register_template_directory(&self, prefix: &str, directory: impl Into<PathBuf>) -> Result<(), AdapterError> {
        let directory = directory.into();
        {
            let directories = self.directories.read().unwrap();
            if directories.contains_key(prefix) {
                return Err(AdapterError::DuplicatePrefix(prefix.to_string()));
            }
        }

        let config = meta::merged_config(&self.template_root, &directory)?;
        let invokers = match config.get("invoker") {
            Some(invoker_config) => {
                let pool_size = config
                    .get("pool_size")
                    .and_then(|v| v.as_u64())
                    .map(|v| v as usize)
                    .unwrap_or(self.default_pool_size);
                if pool_size == 0 {
                    return Err(AdapterError::EmptyInvokerPool(directory.display().to_string()));
                }
                let kind = invoker_config
                    .get("type")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| AdapterError::MissingInvokerConfig(directory.display().to_string()))?;
                let params: JsonValue = serde_json::to_value(invoker_config)
                    .map_err(|e| AdapterError::Meta(directory.display().to_string(), e.to_string()))?;
                let mut invokers = Vec::with_capacity(pool_size);
                for _ in 0..pool_size {
                    invokers.push(genie_providers::build_invoker(kind, &params)?);
                }
                Some(InvokerBag::new(invokers))
            }
            None => None,
        };

        self.directories
            .write()
            .unwrap()
            .insert(prefix.to_string(), Arc::new(TemplateDirectory { directory, config, invokers }));
        Ok(())
    }

    /// Recursively registers every subdirectory of `start` (depth-first, so
    /// children register before their parent), each keyed by its own
    /// directory name — mirrors `_add_all_directories` in the ported source.
    pub fn register_all(&self, start: &Path) -> Result<(), AdapterError> {
        let entries = std::fs::read_dir(start).map_err(|e| AdapterError::Io(start.display().to_string(), e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| AdapterError::Io(start.display().to_string(), e.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                self.register_all(&path)?;
            }
        }
        let prefix = start
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AdapterError::Io(start.display().to_string(), "directory has no name".to_string()))?;
        self.register_template_directory(prefix, start.to_path_buf())
    }

    fn jinja_env(&self) -> minijinja::Environment<'static> {
        let directories = self.directories.clone();
        let mut env = minijinja::Environment::new();
        env.set_loader(move |name| {
            let Some((prefix, rest)) = split_prefix(name) else { return Ok(None) };
            let directory = { directories.read().unwrap().get(prefix).cloned() };
            let Some(directory) = directory else { return Ok(None) };
            match std::fs::read_to_string(directory.directory.join(rest)) {
                Ok(source) => Ok(Some(source)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(minijinja::Error::new(minijinja::ErrorKind::TemplateNotFound, e.to_string())),
            }
        });
        env
    }

    fn directory_for(&self, prefix: &str) -> Option<Arc<TemplateDirectory>> {
        self.directories.read().unwrap().get(prefix).cloned()
    }
}

fn split_prefix(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once('/')
}

#[async_trait]
impl TemplateEnvironment for GenieTemplateEnvironment {
    fn render(&self, name: &str, context: &JsonValue) -> Result<String, CoreError> {
        let env = self.jinja_env();
        let template = env.get_template(name).map_err(AdapterError::from)?;
        let rendered = template.render(context).map_err(AdapterError::from)?;
        Ok(rendered)
    }

    async fn invoke(&self, name: &str, context: &JsonValue) -> Result<String, CoreError> {
        let rendered = self.render(name, context)?;
        let (prefix, _) = split_prefix(name)
            .ok_or_else(|| CoreError::TemplateError(format!("malformed template name {name:?}")))?;
        let directory = self
            .directory_for(prefix)
            .ok_or_else(|| CoreError::TemplateError(format!("no template directory registered for prefix {prefix:?}")))?;
        let bag = directory
            .invokers
            .as_ref()
            .ok_or_else(|| CoreError::TemplateError(format!("prefix {prefix:?} has no invoker configured")))?;
        let lease = bag.acquire().await;
        lease.invoke(&rendered).await.map_err(|e| CoreError::InvokerError(e.to_string()))
    }

    fn leaf_has_invoker(&self, name: &str) -> bool {
        match split_prefix(name) {
            Some((prefix, _)) => self.directory_for(prefix).map(|d| d.invokers.is_some()).unwrap_or(false),
            None => false,
        }
    }

    fn resolves(&self, name: &str) -> bool {
        match split_prefix(name) {
            Some((prefix, rest)) => self.directory_for(prefix).map(|d| d.directory.join(rest).is_file()).unwrap_or(false),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_env(root: &Path) -> GenieTemplateEnvironment {
        GenieTemplateEnvironment::new(root.to_path_buf(), 2)
    }

    #[test]
    fn renders_a_registered_template() {
        let root = tempfile::tempdir().unwrap();
        let qa_dir = root.path().join("qa");
        fs::create_dir(&qa_dir).unwrap();
        fs::write(qa_dir.join("ask.jinja2"), "Hello, {{ model.name }}!").unwrap();

        let env = make_env(root.path());
        env.register_template_directory("qa", qa_dir).unwrap();

        let rendered = env.render("qa/ask.jinja2", &serde_json::json!({"model": {"name": "Ada"}})).unwrap();
        assert_eq!(rendered, "Hello, Ada!");
    }

    #[tokio::test]
    async fn invoke_uses_registered_verbatim_invoker() {
        let root = tempfile::tempdir().unwrap();
        let qa_dir = root.path().join("qa");
        fs::create_dir(&qa_dir).unwrap();
        fs::write(qa_dir.join("ask.jinja2"), "{{ model.question }}").unwrap();
        fs::write(qa_dir.join("meta.yaml"), "invoker:\n  type: verbatim\n").unwrap();

        let env = make_env(root.path());
        env.register_template_directory("qa", qa_dir).unwrap();
        assert!(env.leaf_has_invoker("qa/ask.jinja2"));

        let result = env.invoke("qa/ask.jinja2", &serde_json::json!({"model": {"question": "2+2?"}})).await.unwrap();
        assert_eq!(result, "2+2?");
    }

    #[test]
    fn resolves_reports_missing_templates() {
        let root = tempfile::tempdir().unwrap();
        let qa_dir = root.path().join("qa");
        fs::create_dir(&qa_dir).unwrap();
        fs::write(qa_dir.join("ask.jinja2"), "x").unwrap();

        let env = make_env(root.path());
        env.register_template_directory("qa", qa_dir).unwrap();
        assert!(env.resolves("qa/ask.jinja2"));
        assert!(!env.resolves("qa/missing.jinja2"));
        assert!(!env.resolves("unknown/ask.jinja2"));
    }
}
