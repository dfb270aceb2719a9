//! Agents module - agent profiles and the workflow that ties them together.

mod profile;
mod workflow;

pub use profile::{AgentProfile, DEVELOPER, REQUIREMENT_GATHERING};
pub use workflow::{Workflow, WorkflowError};
