//! Orchestration engine for multi-agent travel queries.
//!
//! A raw query is classified by the triage router, resolved to an
//! [`OrchestrationPlan`] through the [`AgentRegistry`]'s routing table, and
//! executed by the recursive [`Orchestrator`]. Plans compose four strategy
//! variants:
//!
//! - **Terminal**: invoke one agent.
//! - **Handoff**: delegate the whole request to another plan, depth-guarded.
//! - **Sequential**: run plans strictly in order, each stage seeing every
//!   prior outcome.
//! - **GroupChat**: fan out to several plans concurrently over independent
//!   context snapshots and reassemble results in declared order.
//!
//! Per-branch failures become typed [`AgentOutcome`] statuses rather than
//! errors; the caller always receives an [`OrchestrationResult`] accounting
//! for every branch.

pub mod agents;
pub mod aggregator;
pub mod context;
pub mod engine;
pub mod outcome;
pub mod plan;
pub mod registry;

pub use agents::{Agent, AgentKind, ChatAgent, FlightAgent, ScriptedAgent};
pub use aggregator::ResultAggregator;
pub use context::ExecutionContext;
pub use engine::{Orchestrator, OrchestratorConfig, OrchestrationPhase, RequestId};
pub use outcome::{AgentOutcome, OrchestrationResult, OutcomePayload, OutcomeStatus, RunStatus};
pub use plan::{HandoffTarget, OrchestrationPlan, StagePolicy};
pub use registry::{AgentRegistry, AgentRegistryBuilder, ConfigurationError};

use router::RouterError;
use thiserror::Error;

/// Request-level failures. Everything not listed here is containable and is
/// reported as an outcome status inside the result instead.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Routing(#[from] RouterError),

    #[error("max handoff depth exceeded: depth {depth} over limit {limit}")]
    MaxHandoffDepthExceeded { depth: u32, limit: u32 },

    #[error("plan references unregistered agent '{0}'")]
    UnknownAgent(String),

    #[error("handoff targets unknown intent '{0}'")]
    UnknownIntent(String),
}
