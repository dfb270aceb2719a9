//! Agent profiles.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::AgentId;
use crate::domain::tools::{SAVE_REQUIREMENTS, SAVE_SOLUTION, SEARCH_KNOWLEDGE_BASE};

/// Label of the agent that interviews the human.
pub const REQUIREMENT_GATHERING: &str = "requirement-gathering";
/// Label of the agent that plans the technical solution.
pub const DEVELOPER: &str = "developer";

const REQUIREMENT_GATHERING_PROMPT: &str = "You are an expert Requirement Gathering Agent. \
Your goal is to have a conversation with the user to understand their needs for a Laravel project. \
Ask clarifying questions to gather all necessary details. Once you have a clear understanding, \
use the 'save_requirements' tool to save them. \
Do not propose technical solutions yet, just focus on the 'what' and 'why'.";

const DEVELOPER_PROMPT: &str = "You are an expert Laravel Developer Agent. \
Your goal is to propose technical solutions based on the requirements provided. \
You should plan the database schema, decide on packages, and outline the architecture. \
You do NOT write code, but you propose feasible solutions. \
Use the 'search_knowledge_base' tool to find relevant information about Laravel packages \
and best practices if needed. Once you have a solid plan, use the 'save_solution' tool to save it.";

/// Everything the engine needs to run one agent: its prompt and the tools
/// it may request. Which model answers is decided per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub system_prompt: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl AgentProfile {
    pub fn new(id: AgentId, system_prompt: impl Into<String>, tools: Vec<String>) -> Self {
        Self {
            id,
            system_prompt: system_prompt.into(),
            tools,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn requirement_gathering(id: AgentId) -> Self {
        Self::new(id, REQUIREMENT_GATHERING_PROMPT, vec![SAVE_REQUIREMENTS.to_string()])
    }

    pub fn developer(id: AgentId) -> Self {
        Self::new(
            id,
            DEVELOPER_PROMPT,
            vec![SEARCH_KNOWLEDGE_BASE.to_string(), SAVE_SOLUTION.to_string()],
        )
    }

    pub fn offers(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}
