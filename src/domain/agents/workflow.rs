//! Workflow - the agent catalog plus the routing table over it.
//!
//! Adding an agent means adding a profile and its routing rules here; the
//! driver never branches on agent names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::profile::{AgentProfile, DEVELOPER, REQUIREMENT_GATHERING};
use crate::domain::foundation::{AgentId, ValidationError};
use crate::domain::routing::RoutingTable;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Workflow declares no agents")]
    NoAgents,

    #[error("Agent '{0}' is declared more than once")]
    DuplicateAgent(AgentId),

    #[error("Entry agent '{0}' is not declared")]
    UnknownEntryAgent(AgentId),

    #[error("Routing table references undeclared agent '{0}'")]
    UnknownRoutedAgent(AgentId),

    #[error("Invalid workflow document: {0}")]
    Parse(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub entry_agent: AgentId,
    pub agents: Vec<AgentProfile>,
    #[serde(default)]
    pub routing: RoutingTable,
}

impl Workflow {
    /// Requirement gathering hands off to the developer, which ends the
    /// conversation by saving a solution.
    pub fn reference() -> Result<Self, WorkflowError> {
        let requirements = AgentId::new(REQUIREMENT_GATHERING)?;
        let developer = AgentId::new(DEVELOPER)?;
        Ok(Self {
            entry_agent: requirements.clone(),
            routing: RoutingTable::reference(&requirements, &developer),
            agents: vec![
                AgentProfile::requirement_gathering(requirements),
                AgentProfile::developer(developer),
            ],
        })
    }

    /// Parses and validates a YAML workflow document.
    pub fn from_yaml(document: &str) -> Result<Self, WorkflowError> {
        let workflow: Workflow =
            serde_yaml::from_str(document).map_err(|e| WorkflowError::Parse(e.to_string()))?;
        workflow.validate()?;
        Ok(workflow)
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.agents.is_empty() {
            return Err(WorkflowError::NoAgents);
        }
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if !seen.insert(&agent.id) {
                return Err(WorkflowError::DuplicateAgent(agent.id.clone()));
            }
        }
        if !seen.contains(&self.entry_agent) {
            return Err(WorkflowError::UnknownEntryAgent(self.entry_agent.clone()));
        }
        if let Some(unknown) = self.routing.referenced_agents().find(|a| !seen.contains(a)) {
            return Err(WorkflowError::UnknownRoutedAgent(unknown.clone()));
        }
        Ok(())
    }

    pub fn agent(&self, id: &AgentId) -> Option<&AgentProfile> {
        self.agents.iter().find(|a| &a.id == id)
    }

    /// All tool names offered by any agent.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().flat_map(|a| a.tools.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_workflow_is_valid() {
        let workflow = Workflow::reference().unwrap();
        assert!(workflow.validate().is_ok());
        assert_eq!(workflow.entry_agent.as_str(), REQUIREMENT_GATHERING);
        assert!(workflow.agent(&AgentId::new(DEVELOPER).unwrap()).is_some());
    }

    #[test]
    fn yaml_workflow_loads() {
        let yaml = r#"
entry_agent: analyst
agents:
  - id: analyst
    system_prompt: Gather requirements.
    tools: [save_requirements]
  - id: architect
    system_prompt: Design the system.
    tools: [search_knowledge_base, save_solution]
    temperature: 0.2
routing:
  - tool: save_requirements
    disposition: handoff
    next_agent: architect
  - tool: save_solution
    disposition: terminal
"#;
        let workflow = Workflow::from_yaml(yaml).unwrap();
        assert_eq!(workflow.agents.len(), 2);
        assert_eq!(workflow.agents[1].temperature, Some(0.2));
        assert_eq!(workflow.routing.rules().len(), 2);
    }

    #[test]
    fn unknown_entry_agent_is_rejected() {
        let mut workflow = Workflow::reference().unwrap();
        workflow.entry_agent = AgentId::new("nobody").unwrap();
        assert!(matches!(
            workflow.validate(),
            Err(WorkflowError::UnknownEntryAgent(_))
        ));
    }

    #[test]
    fn handoff_to_undeclared_agent_is_rejected() {
        let mut workflow = Workflow::reference().unwrap();
        workflow.agents.retain(|a| a.id.as_str() != DEVELOPER);
        assert!(matches!(
            workflow.validate(),
            Err(WorkflowError::UnknownRoutedAgent(_))
        ));
    }

    #[test]
    fn duplicate_agents_are_rejected() {
        let mut workflow = Workflow::reference().unwrap();
        let copy = workflow.agents[0].clone();
        workflow.agents.push(copy);
        assert!(matches!(
            workflow.validate(),
            Err(WorkflowError::DuplicateAgent(_))
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            Workflow::from_yaml("entry_agent: [unclosed"),
            Err(WorkflowError::Parse(_))
        ));
    }
}
