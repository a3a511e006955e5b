use serde::{Deserialize, Serialize};

/// Failure policy for a sequential pipeline. Abort keeps behaviour
/// deterministic and is the default; Continue is an explicit opt-in per plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagePolicy {
    #[default]
    Abort,
    Continue,
}

/// Target of a handoff: either an inline nested plan or an intent label
/// resolved through the routing table when the handoff executes. The intent
/// form is the dynamic case that static validation cannot fully cover, which
/// is why the runtime depth counter exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandoffTarget {
    Plan(Box<OrchestrationPlan>),
    Intent(String),
}

/// Recursively composable orchestration strategy.
///
/// A Handoff target may itself be Sequential or GroupChat, which is how an
/// agent with its own internal pipeline is modelled structurally instead of
/// as special-cased code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestrationPlan {
    /// Invoke a single registered agent.
    Terminal(String),
    /// Delegate the whole remaining request to another plan.
    Handoff(HandoffTarget),
    /// Execute plans strictly in declared order, each seeing prior outcomes.
    Sequential {
        stages: Vec<OrchestrationPlan>,
        on_error: StagePolicy,
    },
    /// Fan out to all branches concurrently; results keep declared order.
    GroupChat { branches: Vec<OrchestrationPlan> },
}

impl OrchestrationPlan {
    pub fn terminal(agent: impl Into<String>) -> Self {
        OrchestrationPlan::Terminal(agent.into())
    }

    pub fn handoff(target: OrchestrationPlan) -> Self {
        OrchestrationPlan::Handoff(HandoffTarget::Plan(Box::new(target)))
    }

    pub fn handoff_intent(intent: impl Into<String>) -> Self {
        OrchestrationPlan::Handoff(HandoffTarget::Intent(intent.into()))
    }

    pub fn sequential(stages: Vec<OrchestrationPlan>) -> Self {
        OrchestrationPlan::Sequential {
            stages,
            on_error: StagePolicy::Abort,
        }
    }

    pub fn sequential_continue(stages: Vec<OrchestrationPlan>) -> Self {
        OrchestrationPlan::Sequential {
            stages,
            on_error: StagePolicy::Continue,
        }
    }

    pub fn group_chat(branches: Vec<OrchestrationPlan>) -> Self {
        OrchestrationPlan::GroupChat { branches }
    }

    /// Short label for logs and synthetic outcomes.
    pub fn label(&self) -> String {
        match self {
            OrchestrationPlan::Terminal(agent) => agent.clone(),
            OrchestrationPlan::Handoff(HandoffTarget::Plan(inner)) => {
                format!("handoff({})", inner.label())
            }
            OrchestrationPlan::Handoff(HandoffTarget::Intent(intent)) => {
                format!("handoff(intent:{intent})")
            }
            OrchestrationPlan::Sequential { stages, .. } => {
                format!("sequential[{}]", stages.len())
            }
            OrchestrationPlan::GroupChat { branches } => {
                format!("group_chat[{}]", branches.len())
            }
        }
    }

    /// Every agent name directly reachable without resolving intents.
    pub fn agent_names(&self) -> Vec<&str> {
        match self {
            OrchestrationPlan::Terminal(agent) => vec![agent.as_str()],
            OrchestrationPlan::Handoff(HandoffTarget::Plan(inner)) => inner.agent_names(),
            OrchestrationPlan::Handoff(HandoffTarget::Intent(_)) => Vec::new(),
            OrchestrationPlan::Sequential { stages, .. } => {
                stages.iter().flat_map(|s| s.agent_names()).collect()
            }
            OrchestrationPlan::GroupChat { branches } => {
                branches.iter().flat_map(|b| b.agent_names()).collect()
            }
        }
    }
}
