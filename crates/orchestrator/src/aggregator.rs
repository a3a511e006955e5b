use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::agents::{Agent, AgentKind};
use crate::context::ExecutionContext;
use crate::outcome::{AgentOutcome, OrchestrationResult, OutcomeStatus, RunStatus};

/// Merges the collected outcomes into one [`OrchestrationResult`].
///
/// Deterministic given identical outcome ordering and identical synthesis
/// behaviour: stage markers are assigned here from the already-deterministic
/// collection order, and no branch is ever dropped from the output.
pub struct ResultAggregator {
    synthesizer: Option<Arc<AgentKind>>,
    synthesis_timeout: Duration,
}

impl ResultAggregator {
    pub fn new(synthesizer: Option<Arc<AgentKind>>, synthesis_timeout: Duration) -> Self {
        Self {
            synthesizer,
            synthesis_timeout,
        }
    }

    pub async fn aggregate(
        &self,
        mut outcomes: Vec<AgentOutcome>,
        ctx: &ExecutionContext,
    ) -> OrchestrationResult {
        let mut status = compile_status(&outcomes);
        let mut final_payload = joined_successes(&outcomes);

        // The synthesis agent only runs when there is something to compile.
        if status != RunStatus::Failed {
            if let Some(synthesizer) = &self.synthesizer {
                let synth_ctx = ctx.with_outcomes(&outcomes);
                debug!(agent = synthesizer.name(), "running synthesis agent");
                let outcome =
                    match tokio::time::timeout(self.synthesis_timeout, synthesizer.run(&synth_ctx))
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => AgentOutcome::timed_out(synthesizer.name()),
                    };

                match &outcome.status {
                    OutcomeStatus::Success => {
                        final_payload = outcome.payload.render();
                    }
                    _ => {
                        // Aggregation incomplete: keep the fallback payload
                        // and degrade, but never hide the failure.
                        warn!(agent = synthesizer.name(), "synthesis agent failed");
                        status = RunStatus::PartiallyComplete;
                    }
                }
                outcomes.push(outcome);
            }
        }

        for (index, outcome) in outcomes.iter_mut().enumerate() {
            outcome.stage = index as u32;
        }

        OrchestrationResult {
            outcomes,
            final_payload,
            status,
        }
    }
}

fn compile_status(outcomes: &[AgentOutcome]) -> RunStatus {
    let successes = outcomes.iter().filter(|o| o.status.is_success()).count();
    if successes == 0 {
        RunStatus::Failed
    } else if successes == outcomes.len() {
        RunStatus::Complete
    } else {
        RunStatus::PartiallyComplete
    }
}

fn joined_successes(outcomes: &[AgentOutcome]) -> String {
    let parts: Vec<String> = outcomes
        .iter()
        .filter(|o| o.status.is_success())
        .map(|o| o.payload.render())
        .collect();
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ScriptedAgent;

    fn aggregator_with(synthesizer: Option<AgentKind>) -> ResultAggregator {
        ResultAggregator::new(synthesizer.map(Arc::new), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn all_success_without_synthesizer_is_complete() {
        let ctx = ExecutionContext::new("q");
        let result = aggregator_with(None)
            .aggregate(
                vec![
                    AgentOutcome::success("a", "one"),
                    AgentOutcome::success("b", "two"),
                ],
                &ctx,
            )
            .await;

        assert_eq!(result.status, RunStatus::Complete);
        assert_eq!(result.final_payload, "one\n\ntwo");
        let stages: Vec<u32> = result.outcomes.iter().map(|o| o.stage).collect();
        assert_eq!(stages, [0, 1]);
    }

    #[tokio::test]
    async fn mixed_outcomes_are_partially_complete() {
        let ctx = ExecutionContext::new("q");
        let result = aggregator_with(None)
            .aggregate(
                vec![
                    AgentOutcome::success("a", "one"),
                    AgentOutcome::timed_out("b"),
                ],
                &ctx,
            )
            .await;
        assert_eq!(result.status, RunStatus::PartiallyComplete);
        assert_eq!(result.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn all_failed_skips_synthesis() {
        let ctx = ExecutionContext::new("q");
        let result = aggregator_with(Some(AgentKind::Scripted(ScriptedAgent::fixed(
            "synopsis", "summary",
        ))))
        .aggregate(vec![AgentOutcome::failed("a", "boom")], &ctx)
        .await;

        assert_eq!(result.status, RunStatus::Failed);
        // No synthesis outcome was appended.
        assert_eq!(result.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn synthesis_payload_replaces_joined_text() {
        let ctx = ExecutionContext::new("q");
        let result = aggregator_with(Some(AgentKind::Scripted(ScriptedAgent::fixed(
            "synopsis",
            "the one-line summary",
        ))))
        .aggregate(vec![AgentOutcome::success("a", "long text")], &ctx)
        .await;

        assert_eq!(result.status, RunStatus::Complete);
        assert_eq!(result.final_payload, "the one-line summary");
        assert_eq!(result.outcomes.last().unwrap().agent, "synopsis");
    }

    #[tokio::test]
    async fn failing_synthesis_degrades_but_keeps_fallback() {
        let ctx = ExecutionContext::new("q");
        let result = aggregator_with(Some(AgentKind::Scripted(ScriptedAgent::failing(
            "synopsis",
            "capability down",
        ))))
        .aggregate(vec![AgentOutcome::success("a", "useful")], &ctx)
        .await;

        assert_eq!(result.status, RunStatus::PartiallyComplete);
        assert_eq!(result.final_payload, "useful");
        assert!(matches!(
            result.outcomes.last().unwrap().status,
            OutcomeStatus::Failed(_)
        ));
    }
}
