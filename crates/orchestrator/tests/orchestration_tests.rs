//! End-to-end engine tests over scripted agents and a scripted classifier.
//! Everything here is deterministic: no network, no wall-clock dependence.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use llm::{LlmClient, ProviderKind, ScriptedProvider};
use orchestrator::{
    AgentKind, AgentRegistry, FlightAgent, OrchestrationError, OrchestrationPlan, Orchestrator,
    OrchestratorConfig, OutcomeStatus, RunStatus, ScriptedAgent,
};
use router::TriageRouter;
use tools::ScriptedFlightSearch;

/// Router whose classifier always answers with the given JSON.
fn fixed_router(classification_json: &str) -> TriageRouter {
    let provider = ScriptedProvider::new().default_response(classification_json);
    TriageRouter::new(LlmClient::new(ProviderKind::Scripted(provider)))
}

fn destination_registry() -> Arc<AgentRegistry> {
    let registry = AgentRegistry::builder()
        .agent(AgentKind::Scripted(ScriptedAgent::fixed(
            "travel_specialist",
            "Lisbon: hills, trams, pasteis de nata.",
        )))
        .agent(AgentKind::Scripted(ScriptedAgent::fixed(
            "weather_specialist",
            "Sunny, 24C all week.",
        )))
        .agent(AgentKind::Scripted(ScriptedAgent::fixed(
            "entertainment_specialist",
            "Fado houses in Alfama.",
        )))
        .agent(AgentKind::Scripted(ScriptedAgent::fixed(
            "sport_specialist",
            "Benfica plays Saturday.",
        )))
        .agent(AgentKind::Scripted(ScriptedAgent::fixed(
            "synopsis_specialist",
            "Lisbon in short: sun, fado, football.",
        )))
        .route(
            "destination_info",
            OrchestrationPlan::handoff(OrchestrationPlan::sequential(vec![
                OrchestrationPlan::terminal("travel_specialist"),
                OrchestrationPlan::terminal("weather_specialist"),
                OrchestrationPlan::terminal("entertainment_specialist"),
                OrchestrationPlan::terminal("sport_specialist"),
            ])),
        )
        .synthesizer("synopsis_specialist")
        .build()
        .expect("valid routing table");
    Arc::new(registry)
}

#[tokio::test]
async fn destination_pipeline_yields_ordered_outcomes_and_synthesis() {
    let orchestrator = Orchestrator::new(
        destination_registry(),
        fixed_router(r#"{"intent": "destination_info", "destination": "Lisbon"}"#),
        OrchestratorConfig::default(),
    );

    let result = orchestrator
        .handle("Tell me about Lisbon in June")
        .await
        .expect("pipeline completes");

    assert_eq!(result.status, RunStatus::Complete);
    assert_eq!(result.outcomes.len(), 5);

    let agents: Vec<&str> = result.outcomes.iter().map(|o| o.agent.as_str()).collect();
    assert_eq!(
        agents,
        [
            "travel_specialist",
            "weather_specialist",
            "entertainment_specialist",
            "sport_specialist",
            "synopsis_specialist",
        ]
    );
    assert_eq!(result.final_payload, "Lisbon in short: sun, fado, football.");

    let stages: Vec<u32> = result.outcomes.iter().map(|o| o.stage).collect();
    assert_eq!(stages, [0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn flight_tool_failure_fails_the_run() {
    let llm = LlmClient::new(ProviderKind::Scripted(
        ScriptedProvider::new().default_response("unreached"),
    ));
    let registry = AgentRegistry::builder()
        .agent(AgentKind::Flight(FlightAgent::new(
            "flight_specialist",
            "flight search assistant",
            llm,
            Arc::new(ScriptedFlightSearch::failing()),
        )))
        .route(
            "flight_search",
            OrchestrationPlan::handoff(OrchestrationPlan::terminal("flight_specialist")),
        )
        .build()
        .expect("valid routing table");

    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "flight_search", "destination": "Tokyo"}"#),
        OrchestratorConfig::default(),
    );

    let result = orchestrator
        .handle("Find me a flight to Tokyo")
        .await
        .expect("engine surfaces the failure as a result");

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.outcomes.len(), 1);
    match &result.outcomes[0].status {
        OutcomeStatus::Failed(reason) => assert!(reason.contains("ToolError")),
        other => panic!("expected a failed outcome, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_group_chat_branch_is_marked_timed_out_in_declared_order() {
    let registry = AgentRegistry::builder()
        .agent(AgentKind::Scripted(ScriptedAgent::fixed(
            "support_agent",
            "Your booking is confirmed.",
        )))
        .agent(AgentKind::Scripted(
            ScriptedAgent::fixed("sport_specialist", "never answers in time")
                .with_delay(Duration::from_secs(120)),
        ))
        .route(
            "booking_support",
            OrchestrationPlan::group_chat(vec![
                OrchestrationPlan::terminal("support_agent"),
                OrchestrationPlan::terminal("sport_specialist"),
            ]),
        )
        .build()
        .expect("valid routing table");

    let config = OrchestratorConfig {
        agent_timeout: Duration::from_secs(300),
        branch_timeout: Duration::from_secs(10),
        ..OrchestratorConfig::default()
    };
    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "booking_support"}"#),
        config,
    );

    let result = orchestrator
        .handle("Is my booking confirmed, and who plays tonight?")
        .await
        .expect("group chat degrades instead of failing");

    assert_eq!(result.status, RunStatus::PartiallyComplete);
    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.outcomes[0].agent, "support_agent");
    assert!(result.outcomes[0].status.is_success());
    assert_eq!(result.outcomes[1].agent, "sport_specialist");
    assert_eq!(result.outcomes[1].status, OutcomeStatus::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn group_chat_preserves_declared_order_regardless_of_latency() {
    let registry = AgentRegistry::builder()
        .agent(AgentKind::Scripted(
            ScriptedAgent::fixed("slow_first", "first declared")
                .with_delay(Duration::from_millis(500)),
        ))
        .agent(AgentKind::Scripted(ScriptedAgent::fixed(
            "fast_second",
            "second declared",
        )))
        .route(
            "both",
            OrchestrationPlan::group_chat(vec![
                OrchestrationPlan::terminal("slow_first"),
                OrchestrationPlan::terminal("fast_second"),
            ]),
        )
        .build()
        .expect("valid routing table");

    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "both"}"#),
        OrchestratorConfig::default(),
    );

    let first = orchestrator.handle("q").await.expect("run one");
    let second = orchestrator.handle("q").await.expect("run two");

    let agents: Vec<&str> = first.outcomes.iter().map(|o| o.agent.as_str()).collect();
    assert_eq!(agents, ["slow_first", "fast_second"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn sequential_aborts_after_a_failed_stage_by_default() {
    let registry = AgentRegistry::builder()
        .agent(AgentKind::Scripted(ScriptedAgent::fixed("a", "ok")))
        .agent(AgentKind::Scripted(ScriptedAgent::failing("b", "boom")))
        .agent(AgentKind::Scripted(ScriptedAgent::fixed("c", "unreached")))
        .route(
            "pipeline",
            OrchestrationPlan::sequential(vec![
                OrchestrationPlan::terminal("a"),
                OrchestrationPlan::terminal("b"),
                OrchestrationPlan::terminal("c"),
            ]),
        )
        .build()
        .expect("valid routing table");

    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "pipeline"}"#),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.handle("q").await.expect("aborted pipeline");
    assert_eq!(result.status, RunStatus::PartiallyComplete);
    let agents: Vec<&str> = result.outcomes.iter().map(|o| o.agent.as_str()).collect();
    assert_eq!(agents, ["a", "b"]);
}

#[tokio::test]
async fn sequential_continue_runs_every_stage() {
    let registry = AgentRegistry::builder()
        .agent(AgentKind::Scripted(ScriptedAgent::fixed("a", "ok")))
        .agent(AgentKind::Scripted(ScriptedAgent::failing("b", "boom")))
        .agent(AgentKind::Scripted(ScriptedAgent::fixed("c", "still runs")))
        .route(
            "pipeline",
            OrchestrationPlan::sequential_continue(vec![
                OrchestrationPlan::terminal("a"),
                OrchestrationPlan::terminal("b"),
                OrchestrationPlan::terminal("c"),
            ]),
        )
        .build()
        .expect("valid routing table");

    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "pipeline"}"#),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.handle("q").await.expect("full pipeline");
    let agents: Vec<&str> = result.outcomes.iter().map(|o| o.agent.as_str()).collect();
    assert_eq!(agents, ["a", "b", "c"]);
    assert_eq!(result.status, RunStatus::PartiallyComplete);
}

#[tokio::test]
async fn handoff_chain_beyond_the_limit_is_a_typed_error() {
    // Acyclic chain of intent handoffs longer than the configured limit.
    let mut builder = AgentRegistry::builder().agent(AgentKind::Scripted(ScriptedAgent::fixed(
        "leaf",
        "made it to the end",
    )));
    for hop in 0..6 {
        builder = builder.route(
            format!("hop_{hop}"),
            OrchestrationPlan::handoff_intent(format!("hop_{}", hop + 1)),
        );
    }
    builder = builder.route("hop_6", OrchestrationPlan::terminal("leaf"));
    let registry = builder.build().expect("acyclic chain passes validation");

    let config = OrchestratorConfig {
        max_handoff_depth: 3,
        ..OrchestratorConfig::default()
    };
    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "hop_0"}"#),
        config,
    );

    let err = orchestrator.handle("q").await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::MaxHandoffDepthExceeded { depth: 4, limit: 3 }
    ));
}

#[tokio::test]
async fn deep_handoff_inside_a_pipeline_degrades_that_stage_only() {
    let mut builder = AgentRegistry::builder()
        .agent(AgentKind::Scripted(ScriptedAgent::fixed("a", "ok")))
        .agent(AgentKind::Scripted(ScriptedAgent::fixed("leaf", "deep")));
    for hop in 0..6 {
        builder = builder.route(
            format!("hop_{hop}"),
            OrchestrationPlan::handoff_intent(format!("hop_{}", hop + 1)),
        );
    }
    builder = builder.route("hop_6", OrchestrationPlan::terminal("leaf"));
    builder = builder.route(
        "mixed",
        OrchestrationPlan::sequential_continue(vec![
            OrchestrationPlan::terminal("a"),
            OrchestrationPlan::handoff_intent("hop_0"),
        ]),
    );
    let registry = builder.build().expect("valid routing table");

    let config = OrchestratorConfig {
        max_handoff_depth: 3,
        ..OrchestratorConfig::default()
    };
    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "mixed"}"#),
        config,
    );

    let result = orchestrator.handle("q").await.expect("stage-level capture");
    assert_eq!(result.outcomes.len(), 2);
    assert!(result.outcomes[0].status.is_success());
    match &result.outcomes[1].status {
        OutcomeStatus::Failed(reason) => assert!(reason.contains("handoff depth")),
        other => panic!("expected captured depth failure, got {other:?}"),
    }
    assert_eq!(result.status, RunStatus::PartiallyComplete);
}

#[tokio::test]
async fn cancelled_request_records_a_failed_run() {
    let registry = AgentRegistry::builder()
        .agent(AgentKind::Scripted(ScriptedAgent::fixed("a", "ok")))
        .route("only", OrchestrationPlan::terminal("a"))
        .build()
        .expect("valid routing table");

    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "only"}"#),
        OrchestratorConfig::default(),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = orchestrator
        .handle_cancellable("q", cancel)
        .await
        .expect("cancellation is a recorded result");

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(
        result.outcomes[0].status,
        OutcomeStatus::Failed("cancelled".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_reaches_in_flight_group_chat_branches() {
    let registry = AgentRegistry::builder()
        .agent(AgentKind::Scripted(ScriptedAgent::fixed(
            "fast_agent",
            "done already",
        )))
        .agent(AgentKind::Scripted(
            ScriptedAgent::fixed("slow_agent", "never finishes")
                .with_delay(Duration::from_secs(50)),
        ))
        .route(
            "both",
            OrchestrationPlan::group_chat(vec![
                OrchestrationPlan::terminal("fast_agent"),
                OrchestrationPlan::terminal("slow_agent"),
            ]),
        )
        .build()
        .expect("valid routing table");

    // Timeouts are far beyond the cancel point so only cancellation can
    // interrupt the slow branch.
    let config = OrchestratorConfig {
        agent_timeout: Duration::from_secs(300),
        branch_timeout: Duration::from_secs(300),
        ..OrchestratorConfig::default()
    };
    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        fixed_router(r#"{"intent": "both"}"#),
        config,
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let result = orchestrator
        .handle_cancellable("q", cancel)
        .await
        .expect("cancellation degrades branches instead of failing the run");

    assert_eq!(result.status, RunStatus::PartiallyComplete);
    assert_eq!(result.outcomes[0].agent, "fast_agent");
    assert!(result.outcomes[0].status.is_success());
    assert_eq!(result.outcomes[1].agent, "slow_agent");
    assert_eq!(
        result.outcomes[1].status,
        OutcomeStatus::Failed("cancelled".to_string())
    );
}

#[tokio::test]
async fn repeated_runs_produce_identical_results() {
    let orchestrator = Orchestrator::new(
        destination_registry(),
        fixed_router(r#"{"intent": "destination_info", "destination": "Lisbon"}"#),
        OrchestratorConfig::default(),
    );

    let first = orchestrator.handle("Tell me about Lisbon").await.unwrap();
    let second = orchestrator.handle("Tell me about Lisbon").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn unroutable_query_is_ambiguous() {
    let orchestrator = Orchestrator::new(
        destination_registry(),
        fixed_router(r#"{"intent": "stock_tips"}"#),
        OrchestratorConfig::default(),
    );

    let err = orchestrator.handle("Should I buy shares?").await.unwrap_err();
    assert!(matches!(err, OrchestrationError::Routing(_)));
}
