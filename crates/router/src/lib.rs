//! Triage router: classifies a raw query into an intent plus extracted
//! slots. Classification-only by contract: the router never answers the
//! query, and its single side effect is one capability invocation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use llm::LlmClient;

/// Slot names the classifier is asked to fill.
pub const SLOT_DESTINATION: &str = "destination";
pub const SLOT_DATE_RANGE: &str = "date_range";
pub const SLOT_QUERY_TYPE: &str = "query_type";

/// Classified intent plus whatever slots could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: String,
    pub slots: HashMap<String, String>,
}

/// Router failures. Every classification problem (a capability error, an
/// unparseable answer, or an intent outside the routing table) collapses to
/// `RoutingAmbiguous`: no plan may execute for a query we could not place.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("routing ambiguous: {0}")]
    RoutingAmbiguous(String),
}

/// LLM-backed classifier.
#[derive(Clone)]
pub struct TriageRouter {
    llm: LlmClient,
}

impl TriageRouter {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Classify `query` into one of `known_intents`.
    pub async fn classify(
        &self,
        query: &str,
        known_intents: &[String],
    ) -> Result<Classification, RouterError> {
        let prompt = classification_prompt(query, known_intents);
        let response = self
            .llm
            .chat_simple(&prompt)
            .await
            .map_err(|e| RouterError::RoutingAmbiguous(format!("classification failed: {e}")))?;

        let classification = parse_classification(&response)?;
        if !known_intents.contains(&classification.intent) {
            return Err(RouterError::RoutingAmbiguous(format!(
                "intent '{}' is not in the routing table",
                classification.intent
            )));
        }

        info!(
            intent = %classification.intent,
            slots = classification.slots.len(),
            "query classified"
        );
        Ok(classification)
    }
}

fn classification_prompt(query: &str, known_intents: &[String]) -> String {
    format!(
        r#"You are a request router for a travel assistant. Classify the user's
query into exactly one intent from this list: [{intents}].
Never answer the query itself.

USER QUERY: "{query}"

Reply ONLY with JSON in this shape:
{{
    "intent": "<one of the listed intents>",
    "destination": "<destination if mentioned, else omit>",
    "date_range": "<travel dates if mentioned, else omit>",
    "query_type": "<one or two words describing what is asked>"
}}"#,
        intents = known_intents.join(", "),
    )
}

/// Wire shape the classifier is instructed to produce.
#[derive(Deserialize)]
struct WireClassification {
    intent: String,
    #[serde(default)]
    destination: Option<String>,
    #[serde(default)]
    date_range: Option<String>,
    #[serde(default)]
    query_type: Option<String>,
}

/// Pull the first JSON object out of a model response. Models habitually wrap
/// JSON in prose or code fences, so scan for the outermost braces.
fn parse_classification(response: &str) -> Result<Classification, RouterError> {
    let trimmed = response.trim();
    let start = trimmed.find('{');
    let end = trimmed.rfind('}');

    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if s < e => (s, e),
        _ => {
            return Err(RouterError::RoutingAmbiguous(format!(
                "no JSON object in classifier response: {trimmed}"
            )))
        }
    };

    let wire: WireClassification = serde_json::from_str(&trimmed[start..=end])
        .map_err(|e| RouterError::RoutingAmbiguous(format!("malformed classification: {e}")))?;

    let mut slots = HashMap::new();
    for (name, value) in [
        (SLOT_DESTINATION, wire.destination),
        (SLOT_DATE_RANGE, wire.date_range),
        (SLOT_QUERY_TYPE, wire.query_type),
    ] {
        if let Some(value) = value {
            if !value.trim().is_empty() {
                slots.insert(name.to_string(), value);
            }
        }
    }

    debug!(intent = %wire.intent, "parsed classification");
    Ok(Classification {
        intent: wire.intent,
        slots,
    })
}
