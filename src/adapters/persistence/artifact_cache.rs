//! Process-wide cache of saved documents and conversation metadata.
//!
//! Lives as long as the process; it is never the source of truth for the
//! conversation itself (that is the checkpoint store).

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::tools::{Artifact, ArtifactKind};
use crate::ports::{ArtifactSink, ArtifactSinkError, ConversationRecord, StoredArtifacts};

#[derive(Default)]
pub struct ArtifactCache {
    artifacts: RwLock<HashMap<ConversationId, StoredArtifacts>>,
    records: RwLock<HashMap<ConversationId, ConversationRecord>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, conversation_id: &ConversationId) -> Option<StoredArtifacts> {
        self.artifacts.read().await.get(conversation_id).cloned()
    }

    pub async fn record(&self, conversation_id: &ConversationId) -> Option<ConversationRecord> {
        self.records.read().await.get(conversation_id).cloned()
    }

    /// Fills the cache from a backend read without touching newer entries.
    pub async fn warm(&self, conversation_id: &ConversationId, stored: &StoredArtifacts) {
        let mut artifacts = self.artifacts.write().await;
        let entry = artifacts.entry(conversation_id.clone()).or_default();
        if entry.requirements.is_none() {
            entry.requirements = stored.requirements.clone();
        }
        if entry.solution.is_none() {
            entry.solution = stored.solution.clone();
        }
    }
}

#[async_trait]
impl ArtifactSink for ArtifactCache {
    async fn upsert_artifact(
        &self,
        conversation_id: &ConversationId,
        _user_id: Option<UserId>,
        artifact: &Artifact,
    ) -> Result<(), ArtifactSinkError> {
        let mut artifacts = self.artifacts.write().await;
        let entry = artifacts.entry(conversation_id.clone()).or_default();
        let slot = match artifact.kind {
            ArtifactKind::Requirements => &mut entry.requirements,
            ArtifactKind::Solution => &mut entry.solution,
        };
        *slot = Some(artifact.content.clone());
        Ok(())
    }

    async fn record_conversation(&self, record: &ConversationRecord) -> Result<(), ArtifactSinkError> {
        self.records
            .write()
            .await
            .insert(record.conversation_id.clone(), record.clone());
        Ok(())
    }

    async fn load_artifacts(&self, conversation_id: &ConversationId) -> Result<StoredArtifacts, ArtifactSinkError> {
        Ok(self.get(conversation_id).await.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_replaces_instead_of_appending() {
        let cache = ArtifactCache::new();
        let id = ConversationId::generate();

        cache
            .upsert_artifact(&id, None, &Artifact::requirements("v1"))
            .await
            .unwrap();
        cache
            .upsert_artifact(&id, None, &Artifact::requirements("v2"))
            .await
            .unwrap();

        let stored = cache.load_artifacts(&id).await.unwrap();
        assert_eq!(stored.requirements.as_deref(), Some("v2"));
        assert!(stored.solution.is_none());
    }

    #[tokio::test]
    async fn warm_keeps_fresher_entries() {
        let cache = ArtifactCache::new();
        let id = ConversationId::generate();
        cache
            .upsert_artifact(&id, None, &Artifact::solution("fresh"))
            .await
            .unwrap();

        cache
            .warm(
                &id,
                &StoredArtifacts {
                    requirements: Some("from db".to_string()),
                    solution: Some("stale".to_string()),
                },
            )
            .await;

        let stored = cache.get(&id).await.unwrap();
        assert_eq!(stored.requirements.as_deref(), Some("from db"));
        assert_eq!(stored.solution.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn unknown_conversation_has_no_artifacts() {
        let cache = ArtifactCache::new();
        let stored = cache.load_artifacts(&ConversationId::generate()).await.unwrap();
        assert_eq!(stored, StoredArtifacts::default());
    }
}
