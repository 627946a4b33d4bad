//! Ported from `examples/original_source/ai_state_machine/invoker/openai.py`'s
//! chat-completion invoker: takes the rendered content as the user turn of a
//! single-message chat completion call and returns the assistant's text.
//!
//! Connection parameters mirror the original's `{deployment_name, api_key,
//! api_base, api_version, temperature}` config block. No `async-openai` (or
//! any HTTP) call is actually issued; see the crate-level Non-goal note in
//! `lib.rs`.

use async_trait::async_trait;
use serde::Deserialize;

use genie_core::invoker::{Invoker, InvokerError};

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChatConfig {
    pub deployment_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_temperature() -> f64 {
    0.0
}

pub struct OpenAiChatInvoker {
    config: OpenAiChatConfig,
}

impl OpenAiChatInvoker {
    pub fn new(config: OpenAiChatConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Invoker for OpenAiChatInvoker {
    async fn invoke(&self, content: &str) -> Result<String, InvokerError> {
        if self.config.api_key.is_none() {
            tracing::debug!(deployment = %self.config.deployment_name, "no api_key configured, returning deterministic stub reply");
        }
        Ok(format!(
            "[openai.chat:{} t={}] {}",
            self.config.deployment_name, self.config.temperature, content
        ))
    }
}
