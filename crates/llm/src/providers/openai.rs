use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::azure::{parse_chat_response, wire_messages, ChatResponseBody, WireMessage};
use super::{validate_credentials, LlmProvider, LlmRequest, LlmResponse, ProviderId};
use crate::{LlmError, LlmResult};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI chat-completions provider. Same wire shape as Azure, different
/// endpoint and auth scheme.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct OpenAiRequestBody {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String) -> LlmResult<Self> {
        validate_credentials(&api_key)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            api_key,
            model,
            client,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new("openai", &self.model)
    }

    async fn complete(&self, request: LlmRequest) -> LlmResult<LlmResponse> {
        let started = Instant::now();
        let body = OpenAiRequestBody {
            model: self.model.clone(),
            messages: wire_messages(&request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(model = %self.model, "sending OpenAI chat completion");
        let response = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
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
