use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use router::TriageRouter;

use crate::aggregator::ResultAggregator;
use crate::agents::Agent;
use crate::context::ExecutionContext;
use crate::outcome::{AgentOutcome, OrchestrationResult, RunStatus};
use crate::plan::{HandoffTarget, OrchestrationPlan, StagePolicy};
use crate::registry::AgentRegistry;
use crate::OrchestrationError;

/// Engine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of handoff expansions on any execution path.
    pub max_handoff_depth: u32,

    /// Deadline for a single agent invocation.
    pub agent_timeout: Duration,

    /// Deadline for one group-chat branch as a whole.
    pub branch_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_handoff_depth: 5,
            agent_timeout: Duration::from_secs(30),
            branch_timeout: Duration::from_secs(60),
        }
    }
}

/// Lifecycle of one orchestrated request, for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestrationPhase {
    Received,
    Planning,
    Executing,
    Aggregating,
    Completed,
    Failed,
}

impl std::fmt::Display for OrchestrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestrationPhase::Received => write!(f, "received"),
            OrchestrationPhase::Planning => write!(f, "planning"),
            OrchestrationPhase::Executing => write!(f, "executing"),
            OrchestrationPhase::Aggregating => write!(f, "aggregating"),
            OrchestrationPhase::Completed => write!(f, "completed"),
            OrchestrationPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Per-request identifier threaded through log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recursive, composable plan executor.
///
/// Holds only read-only state after construction and is safely shared
/// across concurrent requests; every request gets its own context chain and
/// cancellation token.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    router: TriageRouter,
    aggregator: ResultAggregator,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        router: TriageRouter,
        config: OrchestratorConfig,
    ) -> Self {
        let aggregator = ResultAggregator::new(registry.synthesizer(), config.agent_timeout);
        Self {
            registry,
            router,
            aggregator,
            config,
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// The entry contract: classify, resolve, execute, aggregate.
    pub async fn handle(&self, raw_query: &str) -> Result<OrchestrationResult, OrchestrationError> {
        self.handle_cancellable(raw_query, CancellationToken::new())
            .await
    }

    /// `handle` with caller-owned cancellation. Cancelling the token
    /// propagates to every outstanding branch and nested sub-orchestration.
    pub async fn handle_cancellable(
        &self,
        raw_query: &str,
        cancel: CancellationToken,
    ) -> Result<OrchestrationResult, OrchestrationError> {
        let request_id = RequestId::new();
        info!(request_id = %request_id, phase = %OrchestrationPhase::Received, query = raw_query, "request received");

        let classification = self
            .router
            .classify(raw_query, &self.registry.intents())
            .await?;
        let plan = self
            .registry
            .resolve(&classification.intent)
            .ok_or_else(|| {
                OrchestrationError::UnknownIntent(classification.intent.clone())
            })?;
        debug!(request_id = %request_id, phase = %OrchestrationPhase::Planning, intent = %classification.intent, plan = %plan.label(), "plan resolved");

        let ctx = ExecutionContext::new(raw_query).with_slots(classification.slots);
        info!(request_id = %request_id, phase = %OrchestrationPhase::Executing, "executing plan");
        let outcomes = self.execute(plan, ctx.clone(), &cancel).await?;

        debug!(request_id = %request_id, phase = %OrchestrationPhase::Aggregating, outcomes = outcomes.len(), "aggregating");
        let result = self.aggregator.aggregate(outcomes, &ctx).await;

        let final_phase = match result.status {
            RunStatus::Failed => OrchestrationPhase::Failed,
            _ => OrchestrationPhase::Completed,
        };
        info!(request_id = %request_id, phase = %final_phase, status = %result.status, "request finished");
        Ok(result)
    }

    /// Execute a plan against a context snapshot.
    ///
    /// Only two conditions surface as errors from the root: an unresolvable
    /// reference inside the plan and a handoff chain exceeding the depth
    /// limit. Inside Sequential and GroupChat those same conditions are
    /// captured as `Failed` outcomes of the offending stage or branch, so a
    /// bad sub-plan degrades the result instead of aborting siblings.
    pub fn execute<'a>(
        &'a self,
        plan: &'a OrchestrationPlan,
        ctx: ExecutionContext,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<AgentOutcome>, OrchestrationError>> {
        async move {
            match plan {
                OrchestrationPlan::Terminal(agent_name) => {
                    self.run_terminal(agent_name, &ctx, cancel).await
                }
                OrchestrationPlan::Handoff(target) => {
                    let next_ctx = ctx.handoff();
                    if next_ctx.depth > self.config.max_handoff_depth {
                        warn!(depth = next_ctx.depth, "handoff depth limit hit");
                        return Err(OrchestrationError::MaxHandoffDepthExceeded {
                            depth: next_ctx.depth,
                            limit: self.config.max_handoff_depth,
                        });
                    }
                    let resolved = match target {
                        HandoffTarget::Plan(inner) => inner.as_ref(),
                        HandoffTarget::Intent(intent) => self
                            .registry
                            .resolve(intent)
                            .ok_or_else(|| OrchestrationError::UnknownIntent(intent.clone()))?,
                    };
                    // Pass-through: the delegating layer contributes no
                    // outcome of its own.
                    self.execute(resolved, next_ctx, cancel).await
                }
                OrchestrationPlan::Sequential { stages, on_error } => {
                    self.run_sequential(stages, *on_error, ctx, cancel).await
                }
                OrchestrationPlan::GroupChat { branches } => {
                    self.run_group_chat(branches, ctx, cancel).await
                }
            }
        }
        .boxed()
    }

    async fn run_terminal(
        &self,
        agent_name: &str,
        ctx: &ExecutionContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<AgentOutcome>, OrchestrationError> {
        let agent = self
            .registry
            .agent(agent_name)
            .ok_or_else(|| OrchestrationError::UnknownAgent(agent_name.to_string()))?;

        if cancel.is_cancelled() {
            return Ok(vec![AgentOutcome::failed(agent_name, "cancelled")]);
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => AgentOutcome::failed(agent_name, "cancelled"),
            invoked = tokio::time::timeout(self.config.agent_timeout, agent.run(ctx)) => {
                match invoked {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(agent = agent_name, "agent invocation deadline exceeded");
                        AgentOutcome::timed_out(agent_name)
                    }
                }
            }
        };
        Ok(vec![outcome])
    }

    async fn run_sequential(
        &self,
        stages: &[OrchestrationPlan],
        on_error: StagePolicy,
        ctx: ExecutionContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<AgentOutcome>, OrchestrationError> {
        let mut collected: Vec<AgentOutcome> = Vec::new();
        let mut stage_ctx = ctx;

        for stage in stages {
            let stage_outcomes = match self.execute(stage, stage_ctx.clone(), cancel).await {
                Ok(outcomes) => outcomes,
                // Smallest enclosing combinator: a failed sub-plan becomes
                // this stage's outcome instead of aborting the caller.
                Err(e) => vec![AgentOutcome::failed(stage.label(), e.to_string())],
            };

            let stage_failed = stage_outcomes.iter().any(|o| !o.status.is_success());
            stage_ctx = stage_ctx.with_outcomes(&stage_outcomes);
            collected.extend(stage_outcomes);

            if stage_failed && on_error == StagePolicy::Abort {
                debug!(stage = %stage.label(), "aborting pipeline after failed stage");
                break;
            }
        }

        Ok(collected)
    }

    async fn run_group_chat(
        &self,
        branches: &[OrchestrationPlan],
        ctx: ExecutionContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<AgentOutcome>, OrchestrationError> {
        // Independent snapshot per branch: no branch can write into another
        // branch's context.
        let branch_futures = branches.iter().map(|branch| {
            let snapshot = ctx.clone();
            async move {
                tokio::time::timeout(
                    self.config.branch_timeout,
                    self.execute(branch, snapshot, cancel),
                )
                .await
            }
        });

        let finished = join_all(branch_futures).await;

        // Reassemble in declared plan order, not completion order.
        let mut collected = Vec::new();
        for (branch, finish) in branches.iter().zip(finished) {
            match finish {
                Ok(Ok(outcomes)) => collected.extend(outcomes),
                Ok(Err(e)) => collected.push(AgentOutcome::failed(branch.label(), e.to_string())),
                Err(_) => {
                    warn!(branch = %branch.label(), "group chat branch timed out");
                    collected.push(AgentOutcome::timed_out(branch.label()));
                }
            }
        }
        Ok(collected)
    }
}
