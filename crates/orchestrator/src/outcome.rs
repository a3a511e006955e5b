use serde::{Deserialize, Serialize};

/// Result payload produced by one agent invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomePayload {
    Text(String),
    Structured(serde_json::Value),
}

impl OutcomePayload {
    /// Text rendering used for history prompts and final payload assembly.
    pub fn render(&self) -> String {
        match self {
            OutcomePayload::Text(text) => text.clone(),
            OutcomePayload::Structured(value) => value.to_string(),
        }
    }
}

/// Per-invocation status. Failures stay typed and local; a failing branch
/// never aborts unrelated work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success,
    Failed(String),
    TimedOut,
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }
}

/// One agent's contribution to an orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutcome {
    /// Producing agent's identity.
    pub agent: String,
    pub payload: OutcomePayload,
    pub status: OutcomeStatus,
    /// Elapsed-stage marker: position in the final deterministic ordering,
    /// assigned during aggregation.
    pub stage: u32,
}

impl AgentOutcome {
    pub fn success(agent: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            payload: OutcomePayload::Text(text.into()),
            status: OutcomeStatus::Success,
            stage: 0,
        }
    }

    pub fn structured(agent: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            agent: agent.into(),
            payload: OutcomePayload::Structured(value),
            status: OutcomeStatus::Success,
            stage: 0,
        }
    }

    pub fn failed(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            agent: agent.into(),
            payload: OutcomePayload::Text(String::new()),
            status: OutcomeStatus::Failed(reason),
            stage: 0,
        }
    }

    pub fn timed_out(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            payload: OutcomePayload::Text(String::new()),
            status: OutcomeStatus::TimedOut,
            stage: 0,
        }
    }
}

/// Overall status of an orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Complete,
    PartiallyComplete,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::PartiallyComplete => write!(f, "partially_complete"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Final compiled answer: every branch's outcome in deterministic order plus
/// a synthesized user-facing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub outcomes: Vec<AgentOutcome>,
    pub final_payload: String,
    pub status: RunStatus,
}
