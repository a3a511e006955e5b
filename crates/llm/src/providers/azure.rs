use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{validate_credentials, LlmProvider, LlmRequest, LlmResponse, ProviderId, TokenUsage};
use crate::{LlmError, LlmResult};

const API_VERSION: &str = "2024-02-01";

/// Azure OpenAI chat-completions provider.
#[derive(Debug, Clone)]
pub struct AzureProvider {
    endpoint: String,
    api_key: String,
    deployment: String,
    client: Client,
}

impl AzureProvider {
    pub fn new(endpoint: String, api_key: String, deployment: String) -> LlmResult<Self> {
        validate_credentials(&api_key)?;
        if endpoint.trim().is_empty() {
            return Err(LlmError::Auth("empty Azure endpoint".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment,
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={API_VERSION}",
            self.endpoint, self.deployment
        )
    }
}

#[derive(Serialize)]
pub(super) struct ChatRequestBody {
    pub(super) messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) temperature: Option<f32>,
}

#[derive(Serialize)]
pub(super) struct WireMessage {
    pub(super) role: &'static str,
    pub(super) content: String,
}

#[derive(Deserialize)]
pub(super) struct ChatResponseBody {
    pub(super) choices: Vec<WireChoice>,
    #[serde(default)]
    pub(super) usage: WireUsage,
    #[serde(default)]
    pub(super) model: String,
}

#[derive(Deserialize)]
pub(super) struct WireChoice {
    pub(super) message: WireChoiceMessage,
}

#[derive(Deserialize)]
pub(super) struct WireChoiceMessage {
    pub(super) content: Option<String>,
}

#[derive(Deserialize, Default)]
pub(super) struct WireUsage {
    #[serde(default)]
    pub(super) prompt_tokens: u32,
    #[serde(default)]
    pub(super) completion_tokens: u32,
}

pub(super) fn wire_messages(request: &LlmRequest) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system_prompt {
        messages.push(WireMessage {
            role: "system",
            content: system.clone(),
        });
    }
    messages.push(WireMessage {
        role: "user",
        content: request.prompt.clone(),
    });
    messages
}

pub(super) fn parse_chat_response(
    body: ChatResponseBody,
    started: Instant,
) -> LlmResult<LlmResponse> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("response carried no choices".to_string()))?;

    Ok(LlmResponse {
        content,
        usage: TokenUsage::new(body.usage.prompt_tokens, body.usage.completion_tokens),
        model: body.model,
        response_time: started.elapsed(),
    })
}

#[async_trait]
impl LlmProvider for AzureProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new("azure", &self.deployment)
    }

    async fn complete(&self, request: LlmRequest) -> LlmResult<LlmResponse> {
        let started = Instant::now();
        let body = ChatRequestBody {
            messages: wire_messages(&request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(deployment = %self.deployment, "sending Azure chat completion");
        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status, text));
        }

        let parsed: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        parse_chat_response(parsed, started)
    }
}
