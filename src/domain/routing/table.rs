//! Declarative routing table.
//!
//! Maps a tool name (optionally scoped to the agent that called it) to what
//! happens once its result is recorded. Deployments load the table from YAML:
//!
//! ```yaml
//! - tool: save_requirements
//!   from_agent: requirement-gathering
//!   disposition: handoff
//!   next_agent: developer
//! - tool: save_solution
//!   disposition: terminal
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::foundation::AgentId;
use crate::domain::tools::{SAVE_REQUIREMENTS, SAVE_SOLUTION, SEARCH_KNOWLEDGE_BASE};

/// What a successful tool result does to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum Disposition {
    /// Re-invoke the same agent with the augmented history.
    Continue,
    /// Make `next_agent` active and run it without waiting for the human.
    Handoff { next_agent: AgentId },
    /// End the conversation.
    Terminal,
}

impl Disposition {
    fn precedence(&self) -> u8 {
        match self {
            Disposition::Continue => 0,
            Disposition::Handoff { .. } => 1,
            Disposition::Terminal => 2,
        }
    }

    /// True when `self` should win over `other` for one batch of results.
    pub fn outranks(&self, other: &Disposition) -> bool {
        self.precedence() > other.precedence()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub tool: String,
    /// Restricts the rule to results of tools requested by this agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_agent: Option<AgentId>,
    #[serde(flatten)]
    pub disposition: Disposition,
}

impl RoutingRule {
    fn matches(&self, tool: &str, agent: &AgentId) -> bool {
        self.tool == tool && self.from_agent.as_ref().map_or(true, |a| a == agent)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    rules: Vec<RoutingRule>,
}

impl RoutingTable {
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        Self { rules }
    }

    /// Two-agent policy: requirements hand off to the developer, a saved
    /// solution ends the conversation, lookups return to the caller.
    pub fn reference(requirements_agent: &AgentId, developer_agent: &AgentId) -> Self {
        Self::new(vec![
            RoutingRule {
                tool: SAVE_REQUIREMENTS.to_string(),
                from_agent: Some(requirements_agent.clone()),
                disposition: Disposition::Handoff {
                    next_agent: developer_agent.clone(),
                },
            },
            RoutingRule {
                tool: SAVE_SOLUTION.to_string(),
                from_agent: None,
                disposition: Disposition::Terminal,
            },
            RoutingRule {
                tool: SEARCH_KNOWLEDGE_BASE.to_string(),
                from_agent: None,
                disposition: Disposition::Continue,
            },
        ])
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Resolves the disposition for a tool called by `agent`.
    ///
    /// An agent-scoped rule wins over an unscoped one; tools without any rule
    /// continue with the same agent.
    pub fn disposition_for(&self, tool: &str, agent: &AgentId) -> Disposition {
        let scoped = self
            .rules
            .iter()
            .find(|r| r.from_agent.is_some() && r.matches(tool, agent));
        let unscoped = || {
            self.rules
                .iter()
                .find(|r| r.from_agent.is_none() && r.matches(tool, agent))
        };
        scoped
            .or_else(unscoped)
            .map(|r| r.disposition.clone())
            .unwrap_or(Disposition::Continue)
    }

    /// Every agent named by a rule, for validation against the catalog.
    pub fn referenced_agents(&self) -> impl Iterator<Item = &AgentId> {
        self.rules.iter().flat_map(|r| {
            let next = match &r.disposition {
                Disposition::Handoff { next_agent } => Some(next_agent),
                _ => None,
            };
            r.from_agent.iter().chain(next)
        })
    }
}
