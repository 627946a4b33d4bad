//! Ported from the same `openai.py` source as [`crate::openai_chat`], but
//! with `response_format` pinned to JSON mode — the original distinguishes
//! the two invoker kinds only by that one parameter, so this wraps
//! `OpenAiChatConfig` rather than duplicating its fields.

use async_trait::async_trait;

use genie_core::invoker::{Invoker, InvokerError};

use crate::openai_chat::OpenAiChatConfig;

pub struct OpenAiJsonInvoker {
    config: OpenAiChatConfig,
}

impl OpenAiJsonInvoker {
    pub fn new(config: OpenAiChatConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Invoker for OpenAiJsonInvoker {
    async fn invoke(&self, content: &str) -> Result<String, InvokerError> {
        let body = serde_json::json!({ "echo": content });
        tracing::debug!(deployment = %self.config.deployment_name, "invoking in json response_format");
        Ok(body.to_string())
    }
}
