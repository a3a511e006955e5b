use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{LlmConfig, LlmError, LlmResult};

mod azure;
mod openai;
mod scripted;

pub use azure::AzureProvider;
pub use openai::OpenAiProvider;
pub use scripted::{ScriptedFailure, ScriptedProvider};

/// Request object for LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_parameters(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

/// Response object from LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub response_time: Duration,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Provider identification.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderId {
    pub provider_type: String,
    pub model: String,
}

impl ProviderId {
    pub fn new(provider_type: &str, model: &str) -> Self {
        Self {
            provider_type: provider_type.to_string(),
            model: model.to_string(),
        }
    }
}

/// Unified LLM provider trait.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique identifier for this provider instance.
    fn id(&self) -> ProviderId;

    /// Execute a completion request.
    async fn complete(&self, request: LlmRequest) -> LlmResult<LlmResponse>;

    /// Human-readable name.
    fn name(&self) -> String {
        let id = self.id();
        format!("{} ({})", id.provider_type, id.model)
    }
}

/// Closed enum over all provider types, so callers dispatch with a match
/// instead of a trait object.
#[derive(Debug, Clone)]
pub enum ProviderKind {
    Azure(AzureProvider),
    OpenAi(OpenAiProvider),
    Scripted(ScriptedProvider),
}

impl ProviderKind {
    /// Build a provider from injected configuration.
    pub fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        match config {
            LlmConfig::Azure {
                endpoint,
                api_key,
                deployment,
            } => Ok(ProviderKind::Azure(AzureProvider::new(
                endpoint.clone(),
                api_key.clone(),
                deployment.clone(),
            )?)),
            LlmConfig::OpenAi { api_key, model } => Ok(ProviderKind::OpenAi(OpenAiProvider::new(
                api_key.clone(),
                model.clone(),
            )?)),
            LlmConfig::Scripted => Ok(ProviderKind::Scripted(ScriptedProvider::default())),
        }
    }
}

#[async_trait]
impl LlmProvider for ProviderKind {
    fn id(&self) -> ProviderId {
        match self {
            ProviderKind::Azure(p) => p.id(),
            ProviderKind::OpenAi(p) => p.id(),
            ProviderKind::Scripted(p) => p.id(),
        }
    }

    async fn complete(&self, request: LlmRequest) -> LlmResult<LlmResponse> {
        match self {
            ProviderKind::Azure(p) => p.complete(request).await,
            ProviderKind::OpenAi(p) => p.complete(request).await,
            ProviderKind::Scripted(p) => p.complete(request).await,
        }
    }
}

pub(crate) fn validate_credentials(api_key: &str) -> LlmResult<()> {
    if api_key.trim().is_empty() {
        return Err(LlmError::Auth("empty API key".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_fields() {
        let request = LlmRequest::new("hello")
            .with_system_prompt("be brief")
            .with_parameters(Some(256), Some(0.2));

        assert_eq!(request.prompt, "hello");
        assert_eq!(request.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(request.max_tokens, Some(256));
    }

    #[test]
    fn provider_kind_from_scripted_config() {
        let provider = ProviderKind::from_config(&LlmConfig::Scripted).expect("scripted builds");
        assert_eq!(provider.id().provider_type, "scripted");
    }

    #[test]
    fn empty_api_key_is_an_auth_error() {
        let err = ProviderKind::from_config(&LlmConfig::OpenAi {
            api_key: "  ".into(),
            model: "gpt-4o-mini".into(),
        })
        .unwrap_err();
        assert!(matches!(err, LlmError::Auth(_)));
    }
}
