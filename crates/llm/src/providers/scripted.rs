use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::trace;

use super::{LlmProvider, LlmRequest, LlmResponse, ProviderId, TokenUsage};
use crate::{LlmError, LlmResult};

/// Deterministic provider with canned responses.
///
/// Used for offline runs and for every test that needs byte-identical results
/// across invocations. The first rule whose pattern occurs in the prompt
/// wins; otherwise the default response is returned.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    rules: Vec<ScriptedRule>,
    default_response: Option<String>,
    latency: Option<Duration>,
    failure: Option<ScriptedFailure>,
}

#[derive(Debug, Clone)]
struct ScriptedRule {
    pattern: String,
    response: String,
}

/// Failure kinds a script can inject, mirroring the real provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    RateLimited,
    Timeout,
    Auth,
    InvalidResponse,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `response` whenever `pattern` occurs in the prompt.
    pub fn rule(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push(ScriptedRule {
            pattern: pattern.into(),
            response: response.into(),
        });
        self
    }

    pub fn default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }

    /// Artificial delay before answering; combined with paused tokio time in
    /// tests to exercise deadline handling.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every request with the given kind.
    pub fn failing(mut self, failure: ScriptedFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    fn respond(&self, prompt: &str) -> LlmResult<String> {
        if let Some(failure) = self.failure {
            return Err(match failure {
                ScriptedFailure::RateLimited => LlmError::RateLimited,
                ScriptedFailure::Timeout => LlmError::Timeout,
                ScriptedFailure::Auth => LlmError::Auth("scripted auth failure".to_string()),
                ScriptedFailure::InvalidResponse => {
                    LlmError::InvalidResponse("scripted invalid response".to_string())
                }
            });
        }

        for rule in &self.rules {
            if prompt.contains(&rule.pattern) {
                return Ok(rule.response.clone());
            }
        }

        self.default_response
            .clone()
            .ok_or_else(|| LlmError::Scripted(format!("no scripted rule matches prompt: {prompt}")))
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new("scripted", "fixture")
    }

    async fn complete(&self, request: LlmRequest) -> LlmResult<LlmResponse> {
        let started = Instant::now();
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let content = self.respond(&request.prompt)?;
        trace!(prompt_len = request.prompt.len(), "scripted completion");
        Ok(LlmResponse {
            content,
            usage: TokenUsage::new(request.prompt.len() as u32 / 4, 0),
            model: "fixture".to_string(),
            response_time: started.elapsed(),
        })
    }
}
