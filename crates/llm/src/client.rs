use std::sync::Arc;

use tracing::debug;

use crate::providers::{LlmProvider, LlmRequest, LlmResponse, ProviderKind};
use crate::{LlmConfig, LlmResult};

/// Facade over the configured provider.
///
/// Cheap to clone; every agent and the router hold one of these.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<ProviderKind>,
}

impl LlmClient {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Build a client straight from injected configuration.
    pub fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        Ok(Self::new(ProviderKind::from_config(config)?))
    }

    pub fn provider_name(&self) -> String {
        self.provider.name()
    }

    /// Full request/response round trip.
    pub async fn complete(&self, request: LlmRequest) -> LlmResult<LlmResponse> {
        debug!(provider = %self.provider.name(), "capability invocation");
        self.provider.complete(request).await
    }

    /// One-shot prompt, text in / text out.
    pub async fn chat_simple(&self, prompt: &str) -> LlmResult<String> {
        let response = self.complete(LlmRequest::new(prompt)).await?;
        Ok(response.content)
    }

    /// Prompt bounded by a domain scope used as the system message.
    pub async fn chat_scoped(&self, scope: &str, prompt: &str) -> LlmResult<String> {
        let response = self
            .complete(LlmRequest::new(prompt).with_system_prompt(scope))
            .await?;
        Ok(response.content)
    }
}
