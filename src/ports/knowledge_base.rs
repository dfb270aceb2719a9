//! Knowledge Base Port - external retrieval service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One retrieved passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum KnowledgeBaseError {
    #[error("Knowledge base unavailable: {0}")]
    Unavailable(String),

    #[error("Knowledge base search failed: {0}")]
    SearchFailed(String),
}

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Returns up to `k` passages most similar to `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeBaseError>;
}
