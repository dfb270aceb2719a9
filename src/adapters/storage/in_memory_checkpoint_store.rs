//! In-Memory Checkpoint Store Adapter
//!
//! Holds conversation state in process memory. Used by tests and by
//! single-instance development deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{ConversationState, Turn};
use crate::domain::foundation::ConversationId;
use crate::ports::{apply_append, CheckpointError, CheckpointStore, CheckpointUpdate};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    states: Arc<RwLock<HashMap<ConversationId, ConversationState>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations
    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }

    /// Writes a state verbatim, bypassing versioning (useful for tests that
    /// simulate a crashed run)
    pub async fn seed(&self, state: ConversationState) {
        self.states
            .write()
            .await
            .insert(state.conversation_id.clone(), state);
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, id: &ConversationId) -> Result<ConversationState, CheckpointError> {
        self.states
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(id.clone()))
    }

    async fn save(&self, state: &ConversationState) -> Result<ConversationState, CheckpointError> {
        let mut stored = state.clone();
        stored.version += 1;
        stored.touch();
        self.states
            .write()
            .await
            .insert(stored.conversation_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn append_and_save(
        &self,
        id: &ConversationId,
        turns: Vec<Turn>,
        update: CheckpointUpdate,
    ) -> Result<ConversationState, CheckpointError> {
        let mut states = self.states.write().await;
        let state = states
            .get_mut(id)
            .ok_or_else(|| CheckpointError::NotFound(id.clone()))?;
        apply_append(state, turns, update);
        Ok(state.clone())
    }
}
