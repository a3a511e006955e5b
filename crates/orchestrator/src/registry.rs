use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::agents::{Agent, AgentKind};
use crate::plan::{HandoffTarget, OrchestrationPlan};

/// Routing-table and plan-shape problems caught before any request is
/// served. Fatal by design: a process with an invalid table must not start.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("intent '{intent}' references unregistered agent '{agent}'")]
    UnknownAgent { intent: String, agent: String },

    #[error("intent '{intent}' contains an empty {combinator} plan")]
    EmptyCombinator {
        intent: String,
        combinator: &'static str,
    },

    #[error("intent '{intent}' hands off to unknown intent '{target}'")]
    UnknownHandoffIntent { intent: String, target: String },

    #[error("handoff cycle through intent '{intent}'")]
    HandoffCycle { intent: String },

    #[error("synthesis agent '{0}' is not registered")]
    UnknownSynthesizer(String),

    #[error("agent '{0}' registered twice")]
    DuplicateAgent(String),
}

/// Immutable registry of agents plus the intent → plan routing table.
/// Validated once at build time, then shared read-only across all concurrent
/// requests.
pub struct AgentRegistry {
    agents: HashMap<String, Arc<AgentKind>>,
    routes: HashMap<String, OrchestrationPlan>,
    synthesizer: Option<String>,
}

impl AgentRegistry {
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::default()
    }

    /// Resolve an intent to its orchestration plan.
    pub fn resolve(&self, intent: &str) -> Option<&OrchestrationPlan> {
        self.routes.get(intent)
    }

    pub fn agent(&self, name: &str) -> Option<Arc<AgentKind>> {
        self.agents.get(name).cloned()
    }

    /// Designated synthesis agent, if one was configured.
    pub fn synthesizer(&self) -> Option<Arc<AgentKind>> {
        self.synthesizer
            .as_ref()
            .and_then(|name| self.agents.get(name).cloned())
    }

    /// Known intent labels, sorted for deterministic prompts.
    pub fn intents(&self) -> Vec<String> {
        let mut intents: Vec<String> = self.routes.keys().cloned().collect();
        intents.sort();
        intents
    }

    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }
}

// Agents hold live clients and are not Debug; print the table shape instead.
impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.agent_names())
            .field("intents", &self.intents())
            .field("synthesizer", &self.synthesizer)
            .finish()
    }
}

/// Builder that owns validation. `build` walks every plan reachable from the
/// table; cycles through dynamically chosen intents are caught here when
/// statically determinable, and by the runtime depth limit otherwise.
#[derive(Default)]
pub struct AgentRegistryBuilder {
    agents: HashMap<String, Arc<AgentKind>>,
    routes: HashMap<String, OrchestrationPlan>,
    synthesizer: Option<String>,
    duplicate: Option<String>,
}

impl AgentRegistryBuilder {
    pub fn agent(mut self, agent: AgentKind) -> Self {
        let name = agent.name().to_string();
        if self.agents.insert(name.clone(), Arc::new(agent)).is_some() {
            self.duplicate.get_or_insert(name);
        }
        self
    }

    pub fn route(mut self, intent: impl Into<String>, plan: OrchestrationPlan) -> Self {
        self.routes.insert(intent.into(), plan);
        self
    }

    /// Designate the agent that compiles prior outcomes into the final
    /// user-facing payload.
    pub fn synthesizer(mut self, agent_name: impl Into<String>) -> Self {
        self.synthesizer = Some(agent_name.into());
        self
    }

    pub fn build(self) -> Result<AgentRegistry, ConfigurationError> {
        if let Some(name) = self.duplicate {
            return Err(ConfigurationError::DuplicateAgent(name));
        }

        for (intent, plan) in &self.routes {
            let mut visiting = HashSet::from([intent.as_str()]);
            self.validate_plan(intent, plan, &mut visiting)?;
        }

        if let Some(name) = &self.synthesizer {
            if !self.agents.contains_key(name) {
                return Err(ConfigurationError::UnknownSynthesizer(name.clone()));
            }
        }

        info!(
            agents = self.agents.len(),
            intents = self.routes.len(),
            "agent registry validated"
        );
        Ok(AgentRegistry {
            agents: self.agents,
            routes: self.routes,
            synthesizer: self.synthesizer,
        })
    }

    fn validate_plan<'a>(
        &'a self,
        intent: &str,
        plan: &'a OrchestrationPlan,
        visiting: &mut HashSet<&'a str>,
    ) -> Result<(), ConfigurationError> {
        match plan {
            OrchestrationPlan::Terminal(agent) => {
                if !self.agents.contains_key(agent) {
                    return Err(ConfigurationError::UnknownAgent {
                        intent: intent.to_string(),
                        agent: agent.clone(),
                    });
                }
                Ok(())
            }
            OrchestrationPlan::Handoff(HandoffTarget::Plan(inner)) => {
                self.validate_plan(intent, inner, visiting)
            }
            OrchestrationPlan::Handoff(HandoffTarget::Intent(target)) => {
                let resolved = self.routes.get(target).ok_or_else(|| {
                    ConfigurationError::UnknownHandoffIntent {
                        intent: intent.to_string(),
                        target: target.clone(),
                    }
                })?;
                if !visiting.insert(target.as_str()) {
                    return Err(ConfigurationError::HandoffCycle {
                        intent: target.clone(),
                    });
                }
                self.validate_plan(intent, resolved, visiting)?;
                visiting.remove(target.as_str());
                Ok(())
            }
            OrchestrationPlan::Sequential { stages, .. } => {
                if stages.is_empty() {
                    return Err(ConfigurationError::EmptyCombinator {
                        intent: intent.to_string(),
                        combinator: "sequential",
                    });
                }
                for stage in stages {
                    self.validate_plan(intent, stage, visiting)?;
                }
                Ok(())
            }
            OrchestrationPlan::GroupChat { branches } => {
                if branches.is_empty() {
                    return Err(ConfigurationError::EmptyCombinator {
                        intent: intent.to_string(),
                        combinator: "group_chat",
                    });
                }
                for branch in branches {
                    self.validate_plan(intent, branch, visiting)?;
                }
                Ok(())
            }
        }
    }
}
