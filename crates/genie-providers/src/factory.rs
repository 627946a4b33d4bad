//! String-keyed invoker factory (spec §4.7: "concrete kinds are registered
//! in a factory keyed by a string type"), the provider-side counterpart of
//! the teacher's property-calculator registry in `chem-providers`.
//!
//! `genie-adapters` calls `build_invoker` once per configured leaf/template
//! prefix, using the `type` and `params` object found in that prefix's
//! `meta.yaml` invoker block.

use std::sync::Arc;

use genie_core::invoker::{Invoker, InvokerError};

use crate::http::HttpConfig;
use crate::neo4j::Neo4jConfig;
use crate::openai_chat::OpenAiChatConfig;
use crate::weaviate::{WeaviateConnection, WeaviateQuery};
use crate::{HttpInvoker, Neo4jInvoker, OpenAiChatInvoker, OpenAiJsonInvoker, VerbatimInvoker, WeaviateInvoker};

/// Builds a boxed `Invoker` for `kind`, deserializing `params` into that
/// kind's config type. `kind` is expected to be one of: `"verbatim"`,
/// `"openai.chat"`, `"openai.json"`, `"weaviate"`, `"neo4j"`, `"http"`.
pub fn build_invoker(kind: &str, params: &serde_json::Value) -> Result<Arc<dyn Invoker>, InvokerError> {
    match kind {
        "verbatim" => Ok(Arc::new(VerbatimInvoker)),
        "openai.chat" => {
            let config: OpenAiChatConfig = parse(params)?;
            Ok(Arc::new(OpenAiChatInvoker::new(config)))
        }
        "openai.json" => {
            let config: OpenAiChatConfig = parse(params)?;
            Ok(Arc::new(OpenAiJsonInvoker::new(config)))
        }
        "weaviate" => {
            let connection: WeaviateConnection = parse(params.get("connection").unwrap_or(&serde_json::Value::Null))?;
            let query: WeaviateQuery = parse(params.get("query").unwrap_or(&serde_json::Value::Null))?;
            Ok(Arc::new(WeaviateInvoker::new(connection, query)))
        }
        "neo4j" => {
            let config: Neo4jConfig = parse(params)?;
            Ok(Arc::new(Neo4jInvoker::new(config)))
        }
        "http" => {
            let config: HttpConfig = parse(params)?;
            Ok(Arc::new(HttpInvoker::new(config)))
        }
        other => Err(InvokerError::Failed(format!("unknown invoker kind {other:?}"))),
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: &serde_json::Value) -> Result<T, InvokerError> {
    serde_json::from_value(value.clone()).map_err(|error| InvokerError::Failed(format!("invalid invoker params: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_verbatim_invoker() {
        let invoker = build_invoker("verbatim", &serde_json::Value::Null).unwrap();
        assert_eq!(invoker.invoke("x").await.unwrap(), "x");
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = build_invoker("bogus", &serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, InvokerError::Failed(_)));
    }
}
