//! Ported from `examples/original_source/ai_state_machine/invoker/verbatim.py`:
//! the identity invoker, used for templates that just need their rendered
//! content returned unchanged (e.g. static prompts, echo steps in tests).

use async_trait::async_trait;

use genie_core::invoker::{Invoker, InvokerError};

#[derive(Debug, Default, Clone)]
pub struct VerbatimInvoker;

#[async_trait]
impl Invoker for VerbatimInvoker {
    async fn invoke(&self, content: &str) -> Result<String, InvokerError> {
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_content() {
        let invoker = VerbatimInvoker;
        assert_eq!(invoker.invoke("hello").await.unwrap(), "hello");
    }
}
