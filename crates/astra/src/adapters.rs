use crate::{
    error::AstraError,
    generation::{ChatMessage, GenerationProvider, Prompt, http::HTTPGenerationProvider},
    outbound::call_outbound,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

/// Runs an [`HTTPGenerationProvider`] over the shared outbound client.
pub struct GenerationFromHTTP {
    inner: Arc<dyn HTTPGenerationProvider>,
}

impl GenerationFromHTTP {
    pub fn new(inner: Arc<dyn HTTPGenerationProvider>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl GenerationProvider for GenerationFromHTTP {
    #[instrument(name = "http_adapter.generate", skip_all)]
    async fn generate(&self, prompt: &Prompt) -> Result<String, AstraError> {
        let req = self.inner.generate_request(prompt)?;
        let resp = call_outbound(req).await?;
        self.inner.parse_generate(resp)
    }

    #[instrument(name = "http_adapter.chat", skip_all)]
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AstraError> {
        let req = self.inner.chat_request(messages)?;
        let resp = call_outbound(req).await?;
        self.inner.parse_generate(resp)
    }
}
