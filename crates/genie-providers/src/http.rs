//! Ported from `examples/original_source/ai_state_machine/invoker/api.py`:
//! a generic HTTP invoker. `content` is JSON-decoded into query/body
//! parameters for `method`/`endpoint`, with `headers` attached to the
//! request. Like the other providers in this crate, no HTTP client is
//! actually wired (see the crate-level Non-goal note in `lib.rs`); the
//! `invoke` body only validates and echoes the request shape it would send.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use genie_core::invoker::{Invoker, InvokerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub method: HttpMethod,
    pub endpoint: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

pub struct HttpInvoker {
    config: HttpConfig,
}

impl HttpInvoker {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(&self, content: &str) -> Result<String, InvokerError> {
        let params: serde_json::Value = serde_json::from_str(content)
            .map_err(|error| InvokerError::Failed(format!("content is not valid JSON query params: {error}")))?;
        tracing::debug!(
            method = ?self.config.method,
            endpoint = %self.config.endpoint,
            header_count = self.config.headers.len(),
            "would send http request"
        );
        let response = serde_json::json!({
            "method": format!("{:?}", self.config.method).to_uppercase(),
            "endpoint": self.config.endpoint,
            "params": params,
        });
        Ok(response.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_json_content() {
        let invoker = HttpInvoker::new(HttpConfig {
            method: HttpMethod::Get,
            endpoint: "https://example.invalid/search".to_string(),
            headers: BTreeMap::new(),
        });
        let err = invoker.invoke("not json").await.unwrap_err();
        assert!(matches!(err, InvokerError::Failed(_)));
    }
}
