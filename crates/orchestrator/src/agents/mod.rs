//! Agent implementations: a closed set of variants behind one `run`
//! contract. Agents are stateless across invocations; everything they know
//! about a request arrives in the [`ExecutionContext`].

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::outcome::AgentOutcome;

mod chat;
mod flight;
mod scripted;

pub use chat::ChatAgent;
pub use flight::FlightAgent;
pub use scripted::ScriptedAgent;

/// Uniform agent contract. `run` never returns an error: capability and tool
/// failures are reported inside the outcome, and the propagation policy is
/// decided by the enclosing plan combinator.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// Free-text domain constraint bounding the capability invocation.
    fn scope(&self) -> &str;

    async fn run(&self, ctx: &ExecutionContext) -> AgentOutcome;
}

/// Closed enum over the concrete agent variants, so registry dispatch is a
/// tagged match rather than downcasting.
pub enum AgentKind {
    Chat(ChatAgent),
    Flight(FlightAgent),
    Scripted(ScriptedAgent),
}

#[async_trait]
impl Agent for AgentKind {
    fn name(&self) -> &str {
        match self {
            AgentKind::Chat(a) => a.name(),
            AgentKind::Flight(a) => a.name(),
            AgentKind::Scripted(a) => a.name(),
        }
    }

    fn scope(&self) -> &str {
        match self {
            AgentKind::Chat(a) => a.scope(),
            AgentKind::Flight(a) => a.scope(),
            AgentKind::Scripted(a) => a.scope(),
        }
    }

    async fn run(&self, ctx: &ExecutionContext) -> AgentOutcome {
        match self {
            AgentKind::Chat(a) => a.run(ctx).await,
            AgentKind::Flight(a) => a.run(ctx).await,
            AgentKind::Scripted(a) => a.run(ctx).await,
        }
    }
}

/// Build the user-side prompt every capability-backed agent sends: the
/// original query, extracted slots, and earlier stages' findings.
pub(crate) fn stage_prompt(ctx: &ExecutionContext) -> String {
    let mut prompt = format!("USER QUERY: {}", ctx.query);

    if !ctx.slots.is_empty() {
        let mut slots: Vec<(&String, &String)> = ctx.slots.iter().collect();
        slots.sort();
        let rendered: Vec<String> = slots.iter().map(|(k, v)| format!("{k}={v}")).collect();
        prompt.push_str(&format!("\nEXTRACTED SLOTS: {}", rendered.join(", ")));
    }

    let digest = ctx.history_digest();
    if !digest.is_empty() {
        prompt.push_str(&format!("\nEARLIER FINDINGS:\n{digest}"));
    }

    prompt
}
