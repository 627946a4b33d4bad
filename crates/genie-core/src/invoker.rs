//! The invoker contract (spec §4.3, component C2).
//!
//! An invoker is the one-operation boundary between the engine and the
//! outside world: given a rendered piece of content it does *something*
//! (call an LLM, query a vector store, hit an HTTP endpoint, run a Cypher
//! query against Neo4j) and returns a string result. The engine never knows
//! which concrete invoker ran; `genie-providers` supplies the closed set of
//! implementations and `genie-adapters` resolves template-name prefixes to
//! them through an `InvokerPool`.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvokerError {
    #[error("invoker failed: {0}")]
    Failed(String),
    #[error("no invoker registered for prefix {0:?}")]
    NoInvokerForPrefix(String),
}

#[async_trait]
pub trait Invoker: Send + Sync {
    /// Invokes this provider with already-rendered `content`, returning its
    /// raw string result. `content` is whatever the template environment
    /// rendered for the leaf bound to this invoker; the invoker does not see
    /// the render context directly.
    async fn invoke(&self, content: &str) -> Result<String, InvokerError>;
}

/// Resolves a leaf/template name to the invoker registered for its prefix
/// (spec §4.3: "invokers are resolved by a name prefix, e.g. `openai.` or
/// `weaviate.`"), and owns the blocking pool each invoker kind runs under.
#[async_trait]
pub trait InvokerPool: Send + Sync {
    fn resolve(&self, template_name: &str) -> Option<&(dyn Invoker)>;

    async fn invoke_named(&self, template_name: &str, content: &str) -> Result<String, InvokerError> {
        match self.resolve(template_name) {
            Some(invoker) => invoker.invoke(content).await,
            None => Err(InvokerError::NoInvokerForPrefix(template_name.to_string())),
        }
    }
}
