use std::time::Duration;

use async_trait::async_trait;

use super::Agent;
use crate::context::ExecutionContext;
use crate::outcome::AgentOutcome;

enum Behaviour {
    Succeed(String),
    Fail(String),
}

/// Deterministic fixture agent: fixed output, optional artificial delay.
/// Backs offline mode and every ordering/determinism test.
pub struct ScriptedAgent {
    name: String,
    behaviour: Behaviour,
    delay: Option<Duration>,
}

impl ScriptedAgent {
    pub fn fixed(name: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: Behaviour::Succeed(response.into()),
            delay: None,
        }
    }

    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: Behaviour::Fail(reason.into()),
            delay: None,
        }
    }

    /// Delay before answering; with paused tokio time this exercises the
    /// engine's deadlines deterministically.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &str {
        "scripted fixture"
    }

    async fn run(&self, _ctx: &ExecutionContext) -> AgentOutcome {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behaviour {
            Behaviour::Succeed(response) => AgentOutcome::success(&self.name, response.clone()),
            Behaviour::Fail(reason) => AgentOutcome::failed(&self.name, reason.clone()),
        }
    }
}
