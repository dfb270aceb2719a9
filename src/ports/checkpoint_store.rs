//! Checkpoint Store Port - durable conversation state keyed by conversation id.
//!
//! Implementations must apply each call atomically per conversation id; the
//! driver additionally serializes whole inbound turns per id, so stores never
//! see two writers for the same conversation from one process.

use async_trait::async_trait;

use crate::domain::conversation::{ConversationState, RoutingHint, Turn};
use crate::domain::foundation::{AgentId, ConversationId};

/// Errors that can occur during checkpoint operations
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("No checkpoint for conversation: {0}")]
    NotFound(ConversationId),

    #[error("Failed to serialize checkpoint: {0}")]
    Serialization(String),

    #[error("Checkpoint store unavailable: {0}")]
    Unavailable(String),
}

impl CheckpointError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Routing fields written together with appended turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointUpdate {
    pub active_agent: AgentId,
    pub routing_hint: RoutingHint,
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Loads the full state of a conversation.
    ///
    /// # Errors
    /// Returns `CheckpointError::NotFound` if the conversation has never
    /// been saved.
    async fn load(&self, id: &ConversationId) -> Result<ConversationState, CheckpointError>;

    /// Replaces the stored state; bumps `version` and `updated_at` and
    /// returns the state as stored.
    async fn save(&self, state: &ConversationState) -> Result<ConversationState, CheckpointError>;

    /// Appends turns and applies the routing update in one write, returning
    /// the new stored state.
    ///
    /// # Errors
    /// Returns `CheckpointError::NotFound` if the conversation does not exist.
    async fn append_and_save(
        &self,
        id: &ConversationId,
        turns: Vec<Turn>,
        update: CheckpointUpdate,
    ) -> Result<ConversationState, CheckpointError>;

    /// Convenience: `load` mapped to `None` on NotFound.
    async fn find(&self, id: &ConversationId) -> Result<Option<ConversationState>, CheckpointError> {
        match self.load(id).await {
            Ok(state) => Ok(Some(state)),
            Err(CheckpointError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Applies an append to a state in memory; shared by store implementations.
pub fn apply_append(state: &mut ConversationState, turns: Vec<Turn>, update: CheckpointUpdate) {
    state.turns.extend(turns);
    state.active_agent = update.active_agent;
    state.routing_hint = update.routing_hint;
    state.version += 1;
    state.touch();
}
