//! Plugin/tool-call interface consumed by agents.
//!
//! A tool takes a structured request and returns a structured response or a
//! typed [`ToolError`]. The orchestration engine treats a tool failure
//! exactly like a capability failure: the owning agent reports a failed
//! outcome and no sibling work is aborted.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

mod flight_search;

pub use flight_search::{FlightSearchConfig, FlightSearchTool, ScriptedFlightSearch};

/// Structured request passed to a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    /// Tool-specific arguments, e.g. departure/destination/date.
    pub args: HashMap<String, String>,
    /// Free-text context from the requesting agent.
    pub context: Option<String>,
}

impl ToolInput {
    pub fn from_args<const N: usize>(args: [(&str, &str); N]) -> Self {
        Self {
            args: args
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            context: None,
        }
    }

    pub fn arg(&self, name: &str) -> Result<&str, ToolError> {
        self.args
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ToolError::MissingArgument(name.to_string()))
    }
}

/// Structured response from a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub result: serde_json::Value,
    /// Human-readable rendering for prompt embedding.
    pub formatted: String,
}

/// Typed tool failures.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("tool call failed: {0}")]
    CallFailed(String),

    #[error("tool transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// Contract every tool implements.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn call(&self, input: ToolInput) -> Result<ToolOutput, ToolError>;
}

/// Registry of tools available to agents. Read-only after construction.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        debug!(tool = tool.name(), "registering tool");
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}
