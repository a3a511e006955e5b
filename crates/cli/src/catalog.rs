//! The travel assistant catalog: the registered agents, the routing table
//! mapping intents to plans, and the scripted offline twin of both.

use std::sync::Arc;

use llm::{LlmClient, ProviderKind, ScriptedProvider};
use orchestrator::{
    AgentKind, AgentRegistry, ChatAgent, ConfigurationError, FlightAgent, OrchestrationPlan,
    ScriptedAgent,
};
use router::TriageRouter;
use tools::{ScriptedFlightSearch, Tool};

pub const INTENT_DESTINATION_INFO: &str = "destination_info";
pub const INTENT_FLIGHT_SEARCH: &str = "flight_search";
pub const INTENT_SPORT_INFO: &str = "sport_info";
pub const INTENT_BOOKING_SUPPORT: &str = "booking_support";
pub const INTENT_SUPPORT: &str = "support";

const TRAVEL_SCOPE: &str = "You are a travel specialist. Recommend sights, \
neighbourhoods, food and day trips for the destination. Stay on travel topics.";
const WEATHER_SCOPE: &str = "You are a weather specialist. Describe typical \
conditions and what to pack for the destination and dates. Nothing else.";
const ENTERTAINMENT_SCOPE: &str = "You are an entertainment specialist. Cover \
concerts, nightlife, shows and cultural events at the destination.";
const SPORT_SCOPE: &str = "You are a sport specialist. Cover local teams, \
fixtures and sporting events relevant to the destination and dates.";
const SYNOPSIS_SCOPE: &str = "You compile a final answer. Merge the earlier \
specialist findings into one concise, well-ordered reply for the traveller.";
const SUPPORT_SCOPE: &str = "You are a customer support agent for a travel \
service. Help with bookings, changes and general questions.";
const FLIGHT_SCOPE: &str = "You are a flight specialist. Present the flight \
listings you are given clearly, with durations and prices.";

/// Build the production routing table over live chat agents.
pub fn live_registry(
    llm: &LlmClient,
    flight_search: Arc<dyn Tool>,
) -> Result<AgentRegistry, ConfigurationError> {
    let chat = |name: &str, scope: &str| {
        AgentKind::Chat(ChatAgent::new(name, scope, llm.clone()))
    };

    registry_with(
        vec![
            chat("travel_specialist", TRAVEL_SCOPE),
            chat("weather_specialist", WEATHER_SCOPE),
            chat("entertainment_specialist", ENTERTAINMENT_SCOPE),
            chat("sport_specialist", SPORT_SCOPE),
            chat("synopsis_specialist", SYNOPSIS_SCOPE),
            chat("support_agent", SUPPORT_SCOPE),
            AgentKind::Flight(FlightAgent::new(
                "flight_specialist",
                FLIGHT_SCOPE,
                llm.clone(),
                flight_search,
            )),
        ],
    )
}

/// Scripted twin of the catalog: same intents and plan shapes, canned
/// answers, no credentials or network.
pub fn offline_registry() -> Result<AgentRegistry, ConfigurationError> {
    let scripted = |name: &str, response: &str| {
        AgentKind::Scripted(ScriptedAgent::fixed(name, response))
    };
    let flight_llm = LlmClient::new(ProviderKind::Scripted(
        ScriptedProvider::new()
            .default_response("Two direct options stand out; the 470 minute itinerary is cheapest."),
    ));

    registry_with(
        vec![
            scripted(
                "travel_specialist",
                "Start in the old town, then the riverside market.",
            ),
            scripted("weather_specialist", "Mild and dry, pack a light jacket."),
            scripted(
                "entertainment_specialist",
                "Live music nightly in the harbour district.",
            ),
            scripted("sport_specialist", "The city derby is on this weekend."),
            scripted(
                "synopsis_specialist",
                "In short: old town by day, harbour by night, derby on the weekend.",
            ),
            scripted("support_agent", "Your booking details are in order."),
            AgentKind::Flight(FlightAgent::new(
                "flight_specialist",
                FLIGHT_SCOPE,
                flight_llm,
                Arc::new(ScriptedFlightSearch::new()),
            )),
        ],
    )
}

fn registry_with(agents: Vec<AgentKind>) -> Result<AgentRegistry, ConfigurationError> {
    let mut builder = AgentRegistry::builder();
    for agent in agents {
        builder = builder.agent(agent);
    }
    builder
        .route(
            INTENT_DESTINATION_INFO,
            OrchestrationPlan::handoff(OrchestrationPlan::sequential(vec![
                OrchestrationPlan::terminal("travel_specialist"),
                OrchestrationPlan::terminal("weather_specialist"),
                OrchestrationPlan::terminal("entertainment_specialist"),
                OrchestrationPlan::terminal("sport_specialist"),
            ])),
        )
        .route(
            INTENT_FLIGHT_SEARCH,
            OrchestrationPlan::handoff(OrchestrationPlan::terminal("flight_specialist")),
        )
        .route(INTENT_SPORT_INFO, OrchestrationPlan::terminal("sport_specialist"))
        .route(
            INTENT_BOOKING_SUPPORT,
            OrchestrationPlan::group_chat(vec![
                OrchestrationPlan::terminal("support_agent"),
                OrchestrationPlan::terminal("flight_specialist"),
            ]),
        )
        .route(INTENT_SUPPORT, OrchestrationPlan::terminal("support_agent"))
        .synthesizer("synopsis_specialist")
        .build()
}

/// Keyword router for offline runs. Patterns are chosen to not occur in the
/// static part of the classification prompt, which lists every intent name.
pub fn offline_router() -> TriageRouter {
    let provider = ScriptedProvider::new()
        .rule("fly", r#"{"intent": "flight_search", "query_type": "flights"}"#)
        .rule(
            "reservation",
            r#"{"intent": "booking_support", "query_type": "booking"}"#,
        )
        .rule("game", r#"{"intent": "sport_info", "query_type": "sport"}"#)
        .default_response(r#"{"intent": "destination_info", "query_type": "general"}"#);
    TriageRouter::new(LlmClient::new(ProviderKind::Scripted(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_catalog_builds_cleanly() {
        let registry = offline_registry().expect("catalog validates");
        assert_eq!(
            registry.intents(),
            [
                INTENT_BOOKING_SUPPORT,
                INTENT_DESTINATION_INFO,
                INTENT_FLIGHT_SEARCH,
                INTENT_SPORT_INFO,
                INTENT_SUPPORT,
            ]
        );
    }

    #[tokio::test]
    async fn offline_router_routes_flights_without_naming_the_intent() {
        let router = offline_router();
        let intents: Vec<String> = offline_registry()
            .expect("catalog validates")
            .intents();
        let classification = router
            .classify("I want to fly to Tokyo next month", &intents)
            .await
            .expect("keyword route");
        assert_eq!(classification.intent, INTENT_FLIGHT_SEARCH);
    }
}
