use async_trait::async_trait;
use tracing::{debug, warn};

use llm::LlmClient;

use super::{stage_prompt, Agent};
use crate::context::ExecutionContext;
use crate::outcome::AgentOutcome;

/// Capability-backed domain agent: a name, a scope constraint, and one
/// capability call per invocation. Covers every instruction-only specialist
/// (travel, weather, entertainment, sport, support, synopsis).
pub struct ChatAgent {
    name: String,
    scope: String,
    llm: LlmClient,
}

impl ChatAgent {
    pub fn new(name: impl Into<String>, scope: impl Into<String>, llm: LlmClient) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            llm,
        }
    }
}

#[async_trait]
impl Agent for ChatAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &str {
        &self.scope
    }

    async fn run(&self, ctx: &ExecutionContext) -> AgentOutcome {
        let prompt = stage_prompt(ctx);
        debug!(agent = %self.name, depth = ctx.depth, "agent invocation");

        match self.llm.chat_scoped(&self.scope, &prompt).await {
            Ok(answer) => AgentOutcome::success(&self.name, answer),
            Err(e) => {
                warn!(agent = %self.name, error = %e, "capability invocation failed");
                AgentOutcome::failed(&self.name, e.to_string())
            }
        }
    }
}
