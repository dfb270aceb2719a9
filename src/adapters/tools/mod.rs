//! Tool handler adapters registered with the dispatcher.

mod save_artifact;
mod search_knowledge_base;

pub use save_artifact::SaveArtifactTool;
pub use search_knowledge_base::SearchKnowledgeBaseTool;
