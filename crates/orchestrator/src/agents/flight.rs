use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use llm::LlmClient;
use tools::{Tool, ToolInput};

use super::{stage_prompt, Agent};
use crate::context::ExecutionContext;
use crate::outcome::AgentOutcome;

/// Flight specialist: looks up real flight listings through the flight
/// search tool, then asks the capability to present them. A tool failure is
/// reported the same way as a capability failure.
pub struct FlightAgent {
    name: String,
    scope: String,
    llm: LlmClient,
    search: Arc<dyn Tool>,
}

impl FlightAgent {
    pub fn new(
        name: impl Into<String>,
        scope: impl Into<String>,
        llm: LlmClient,
        search: Arc<dyn Tool>,
    ) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            llm,
            search,
        }
    }

    fn search_input(ctx: &ExecutionContext) -> ToolInput {
        // Slots the router could not extract fall back to flexible values;
        // the backend treats them as unconstrained.
        let departure = ctx.slot("departure").unwrap_or("nearby");
        let destination = ctx.slot("destination").unwrap_or("anywhere");
        let date = ctx.slot("date_range").unwrap_or("flexible");
        let mut input = ToolInput::from_args([
            ("departure", departure),
            ("destination", destination),
            ("date", date),
        ]);
        input.context = Some(ctx.query.clone());
        input
    }
}

#[async_trait]
impl Agent for FlightAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &str {
        &self.scope
    }

    async fn run(&self, ctx: &ExecutionContext) -> AgentOutcome {
        debug!(agent = %self.name, "flight lookup");
        let listing = match self.search.call(Self::search_input(ctx)).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(agent = %self.name, error = %e, "flight search tool failed");
                return AgentOutcome::failed(&self.name, format!("ToolError: {e}"));
            }
        };

        let prompt = format!(
            "{}\nFLIGHT LISTING:\n{}\nPresent the available flights to the user.",
            stage_prompt(ctx),
            listing.formatted,
        );
        match self.llm.chat_scoped(&self.scope, &prompt).await {
            Ok(answer) => AgentOutcome::success(&self.name, answer),
            Err(e) => AgentOutcome::failed(&self.name, e.to_string()),
        }
    }
}
