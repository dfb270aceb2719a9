//! Tool vocabulary shared by agents, providers and the dispatcher.

mod artifact;
mod definition;

pub use artifact::{Artifact, ArtifactKind};
pub use definition::ToolDefinition;

/// Wire name of the tool that records gathered requirements.
pub const SAVE_REQUIREMENTS: &str = "save_requirements";
/// Wire name of the tool that records the proposed solution.
pub const SAVE_SOLUTION: &str = "save_solution";
/// Wire name of the knowledge base lookup tool.
pub const SEARCH_KNOWLEDGE_BASE: &str = "search_knowledge_base";
