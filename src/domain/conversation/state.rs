//! Conversation state as held by the checkpoint store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::turn::Turn;
use crate::domain::foundation::{AgentId, ConversationId, UserId, ValidationError};

/// Where the conversation stands between driver iterations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoutingHint {
    /// Resting state: the last agent reply is waiting for the human.
    AwaitingHuman,
    /// The last agent reply requested tools that have not all been answered.
    PendingTools,
    /// Tool results recorded; the same agent runs next.
    Continuing,
    /// Control moved to the named agent.
    Handoff(AgentId),
    /// A terminal artifact was saved; the conversation is complete.
    Terminal,
}

impl RoutingHint {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoutingHint::Terminal)
    }
}

impl fmt::Display for RoutingHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingHint::AwaitingHuman => write!(f, "awaiting_human"),
            RoutingHint::PendingTools => write!(f, "pending_tools"),
            RoutingHint::Continuing => write!(f, "continuing"),
            RoutingHint::Handoff(agent) => write!(f, "handoff:{}", agent),
            RoutingHint::Terminal => write!(f, "terminal"),
        }
    }
}

impl FromStr for RoutingHint {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_human" => Ok(RoutingHint::AwaitingHuman),
            "pending_tools" => Ok(RoutingHint::PendingTools),
            "continuing" => Ok(RoutingHint::Continuing),
            "terminal" => Ok(RoutingHint::Terminal),
            other => match other.strip_prefix("handoff:") {
                Some(agent) => Ok(RoutingHint::Handoff(AgentId::new(agent)?)),
                None => Err(ValidationError::invalid_format(
                    "routing_hint",
                    format!("unknown hint '{}'", other),
                )),
            },
        }
    }
}

impl TryFrom<String> for RoutingHint {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoutingHint> for String {
    fn from(hint: RoutingHint) -> Self {
        hint.to_string()
    }
}

/// Full persisted state of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub active_agent: AgentId,
    pub routing_hint: RoutingHint,
    #[serde(default)]
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every save.
    #[serde(default)]
    pub version: u64,
}

impl ConversationState {
    /// Creates an empty conversation resting on the entry agent.
    pub fn new(conversation_id: ConversationId, active_agent: AgentId, user_id: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id,
            user_id,
            active_agent,
            routing_hint: RoutingHint::AwaitingHuman,
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.routing_hint.is_terminal()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
