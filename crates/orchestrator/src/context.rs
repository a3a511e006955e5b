use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::outcome::AgentOutcome;

/// Immutable-per-stage execution snapshot.
///
/// Never mutated in place: every stage derives a new context from the
/// previous one. `depth` counts the Handoff expansions already performed on
/// this path and is non-decreasing along any execution path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub query: String,
    pub slots: HashMap<String, String>,
    pub history: Vec<AgentOutcome>,
    pub depth: u32,
}

impl ExecutionContext {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            slots: HashMap::new(),
            history: Vec::new(),
            depth: 0,
        }
    }

    pub fn with_slots(mut self, slots: HashMap<String, String>) -> Self {
        self.slots = slots;
        self
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }

    /// Derive the context a later stage sees: same query and slots, history
    /// extended with `outcomes`.
    pub fn with_outcomes(&self, outcomes: &[AgentOutcome]) -> Self {
        let mut next = self.clone();
        next.history.extend_from_slice(outcomes);
        next
    }

    /// Derive the context across one handoff expansion.
    pub fn handoff(&self) -> Self {
        let mut next = self.clone();
        next.depth += 1;
        next
    }

    /// History rendering embedded into later stages' prompts, so each stage
    /// can reference earlier outputs.
    pub fn history_digest(&self) -> String {
        let lines: Vec<String> = self
            .history
            .iter()
            .filter(|outcome| outcome.status.is_success())
            .map(|outcome| format!("[{}] {}", outcome.agent, outcome.payload.render()))
            .collect();
        lines.join("\n")
    }
}
