use thiserror::Error;

/// Typed capability failures surfaced to the orchestration engine.
///
/// The engine converts every one of these into an `AgentOutcome` with a
/// failed status; none of them abort an orchestration on their own.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider request timed out")]
    Timeout,

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scripted failure: {0}")]
    Scripted(String),
}

impl LlmError {
    /// Classify an HTTP status the way every remote provider reports errors.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            429 => LlmError::RateLimited,
            401 | 403 => LlmError::Auth(body),
            408 | 504 => LlmError::Timeout,
            _ => LlmError::InvalidResponse(format!("HTTP {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_mapping_covers_common_failure_kinds() {
        assert!(matches!(
            LlmError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            LlmError::RateLimited
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::UNAUTHORIZED, "bad key".into()),
            LlmError::Auth(_)
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::GATEWAY_TIMEOUT, String::new()),
            LlmError::Timeout
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            LlmError::InvalidResponse(_)
        ));
    }
}
