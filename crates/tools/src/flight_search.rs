use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Tool, ToolError, ToolInput, ToolOutput};

const DEFAULT_SEARCH_URL: &str = "https://serpapi.com/search.json";

/// Configuration for the flight search backend. The API key is injected at
/// startup; the tool never reads it from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSearchConfig {
    pub api_key: String,
    pub base_url: String,
}

impl FlightSearchConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_SEARCH_URL.to_string(),
        }
    }
}

/// Google-Flights-style lookup: departure, destination and outbound date in,
/// a structured flight listing out.
pub struct FlightSearchTool {
    config: FlightSearchConfig,
    client: Client,
}

impl FlightSearchTool {
    pub fn new(config: FlightSearchConfig) -> Result<Self, ToolError> {
        if config.api_key.trim().is_empty() {
            return Err(ToolError::CallFailed(
                "flight search API key is empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { config, client })
    }
}

// Keeps the API key out of any Debug rendering.
impl fmt::Debug for FlightSearchTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlightSearchTool")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FlightSearchTool {
    fn name(&self) -> &str {
        "flight_search"
    }

    fn description(&self) -> &str {
        "Searches for flights based on departure, destination, and date"
    }

    async fn call(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let departure = input.arg("departure")?;
        let destination = input.arg("destination")?;
        let date = input.arg("date")?;

        debug!(departure, destination, date, "flight search request");
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("engine", "google_flights"),
                ("departure_id", departure),
                ("arrival_id", destination),
                ("outbound_date", date),
                ("api_key", &self.config.api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "flight search rejected");
            return Err(ToolError::CallFailed(format!(
                "flight search returned HTTP {status}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ToolError::CallFailed(format!("malformed flight listing: {e}")))?;

        Ok(ToolOutput {
            formatted: summarize_flights(&result),
            result,
        })
    }
}

/// Render the interesting part of a flight listing for prompt embedding.
fn summarize_flights(listing: &serde_json::Value) -> String {
    let flights = listing
        .get("best_flights")
        .or_else(|| listing.get("other_flights"))
        .and_then(|v| v.as_array());

    match flights {
        Some(flights) if !flights.is_empty() => {
            let lines: Vec<String> = flights
                .iter()
                .take(5)
                .map(|flight| {
                    let price = flight
                        .get("price")
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    let duration = flight
                        .get("total_duration")
                        .and_then(|d| d.as_u64())
                        .map(|d| format!("{d} min"))
                        .unwrap_or_else(|| "unknown duration".to_string());
                    format!("- {duration}, price {price}")
                })
                .collect();
            lines.join("\n")
        }
        _ => "no flights found for the requested route".to_string(),
    }
}

/// Deterministic flight search used offline and in tests; optionally fails
/// every call to exercise the engine's failure containment.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFlightSearch {
    fail: bool,
}

impl ScriptedFlightSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl Tool for ScriptedFlightSearch {
    fn name(&self) -> &str {
        "flight_search"
    }

    fn description(&self) -> &str {
        "Deterministic flight listing fixture"
    }

    async fn call(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        if self.fail {
            return Err(ToolError::CallFailed(
                "scripted flight backend unavailable".to_string(),
            ));
        }

        let departure = input.arg("departure")?;
        let destination = input.arg("destination")?;
        let date = input.arg("date")?;
        let result = serde_json::json!({
            "best_flights": [
                { "price": 412, "total_duration": 760, "route": [departure, destination], "date": date },
                { "price": 523, "total_duration": 655, "route": [departure, destination], "date": date },
            ]
        });
        Ok(ToolOutput {
            formatted: summarize_flights(&result),
            result,
        })
    }
}
