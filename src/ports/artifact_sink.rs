//! Artifact Sink Port - write-behind persistence owned by the operator
//! application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AgentId, ConversationId, UserId};
use crate::domain::tools::Artifact;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ArtifactSinkError {
    #[error("Artifact store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Conversation metadata mirrored after each completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub conversation_id: ConversationId,
    pub user_id: Option<UserId>,
    pub title: String,
    pub active_agent: AgentId,
    pub status: String,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Latest documents captured for a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifacts {
    pub requirements: Option<String>,
    pub solution: Option<String>,
}

#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Replaces the conversation's document of `artifact.kind`.
    async fn upsert_artifact(
        &self,
        conversation_id: &ConversationId,
        user_id: Option<UserId>,
        artifact: &Artifact,
    ) -> Result<(), ArtifactSinkError>;

    async fn record_conversation(&self, record: &ConversationRecord) -> Result<(), ArtifactSinkError>;

    async fn load_artifacts(&self, conversation_id: &ConversationId) -> Result<StoredArtifacts, ArtifactSinkError>;
}
