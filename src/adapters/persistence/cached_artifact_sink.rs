//! Cache-plus-database artifact sink.
//!
//! Every write lands in the process cache first; the database, when
//! configured, is written behind it. Database failures are logged and do not
//! fail the tool that saved the document.

use async_trait::async_trait;
use std::sync::Arc;

use super::artifact_cache::ArtifactCache;
use crate::domain::foundation::{ConversationId, UserId};
use crate::domain::tools::Artifact;
use crate::ports::{ArtifactSink, ArtifactSinkError, ConversationRecord, StoredArtifacts};

pub struct CachedArtifactSink {
    cache: Arc<ArtifactCache>,
    backend: Option<Arc<dyn ArtifactSink>>,
}

impl CachedArtifactSink {
    pub fn new(cache: Arc<ArtifactCache>) -> Self {
        Self {
            cache,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn ArtifactSink>) -> Self {
        self.backend = Some(backend);
        self
    }
}

#[async_trait]
impl ArtifactSink for CachedArtifactSink {
    async fn upsert_artifact(
        &self,
        conversation_id: &ConversationId,
        user_id: Option<UserId>,
        artifact: &Artifact,
    ) -> Result<(), ArtifactSinkError> {
        self.cache
            .upsert_artifact(conversation_id, user_id, artifact)
            .await?;

        if let Some(backend) = &self.backend {
            if let Err(e) = backend
                .upsert_artifact(conversation_id, user_id, artifact)
                .await
            {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    kind = %artifact.kind,
                    error = %e,
                    "Artifact kept in cache only"
                );
            }
        }
        Ok(())
    }

    async fn record_conversation(&self, record: &ConversationRecord) -> Result<(), ArtifactSinkError> {
        self.cache.record_conversation(record).await?;
        match &self.backend {
            Some(backend) => backend.record_conversation(record).await,
            None => Ok(()),
        }
    }

    /// Cache first; a miss on either document consults the database.
    async fn load_artifacts(&self, conversation_id: &ConversationId) -> Result<StoredArtifacts, ArtifactSinkError> {
        let cached = self.cache.get(conversation_id).await.unwrap_or_default();
        let complete = cached.requirements.is_some() && cached.solution.is_some();

        let backend = match &self.backend {
            Some(backend) if !complete => backend,
            _ => return Ok(cached),
        };

        match backend.load_artifacts(conversation_id).await {
            Ok(stored) => {
                self.cache.warm(conversation_id, &stored).await;
                Ok(self.cache.get(conversation_id).await.unwrap_or_default())
            }
            Err(e) => {
                tracing::warn!(conversation_id = %conversation_id, error = %e, "Serving cached artifacts only");
                Ok(cached)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FlakyBackend {
        fail: bool,
        writes: Mutex<Vec<Artifact>>,
        stored: StoredArtifacts,
    }

    #[async_trait]
    impl ArtifactSink for FlakyBackend {
        async fn upsert_artifact(
            &self,
            _conversation_id: &ConversationId,
            _user_id: Option<UserId>,
            artifact: &Artifact,
        ) -> Result<(), ArtifactSinkError> {
            if self.fail {
                return Err(ArtifactSinkError::Unavailable("down".to_string()));
            }
            self.writes.lock().await.push(artifact.clone());
            Ok(())
        }

        async fn record_conversation(&self, _record: &ConversationRecord) -> Result<(), ArtifactSinkError> {
            if self.fail {
                return Err(ArtifactSinkError::Unavailable("down".to_string()));
            }
            Ok(())
        }

        async fn load_artifacts(&self, _conversation_id: &ConversationId) -> Result<StoredArtifacts, ArtifactSinkError> {
            if self.fail {
                return Err(ArtifactSinkError::Unavailable("down".to_string()));
            }
            Ok(self.stored.clone())
        }
    }

    #[tokio::test]
    async fn writes_reach_cache_and_backend() {
        let backend = Arc::new(FlakyBackend::default());
        let sink = CachedArtifactSink::new(Arc::new(ArtifactCache::new())).with_backend(backend.clone());
        let id = ConversationId::generate();

        sink.upsert_artifact(&id, None, &Artifact::requirements("R")).await.unwrap();

        assert_eq!(backend.writes.lock().await.len(), 1);
        assert_eq!(
            sink.cache.get(&id).await.unwrap().requirements.as_deref(),
            Some("R")
        );
    }

    #[tokio::test]
    async fn backend_failure_does_not_fail_the_save() {
        let backend = Arc::new(FlakyBackend {
            fail: true,
            ..Default::default()
        });
        let sink = CachedArtifactSink::new(Arc::new(ArtifactCache::new())).with_backend(backend);
        let id = ConversationId::generate();

        sink.upsert_artifact(&id, None, &Artifact::solution("S")).await.unwrap();
        let loaded = sink.load_artifacts(&id).await.unwrap();

        assert_eq!(loaded.solution.as_deref(), Some("S"));
    }

    #[tokio::test]
    async fn cache_miss_reads_through_to_backend() {
        let backend = Arc::new(FlakyBackend {
            stored: StoredArtifacts {
                requirements: Some("from db".to_string()),
                solution: None,
            },
            ..Default::default()
        });
        let sink = CachedArtifactSink::new(Arc::new(ArtifactCache::new())).with_backend(backend);

        let loaded = sink.load_artifacts(&ConversationId::generate()).await.unwrap();
        assert_eq!(loaded.requirements.as_deref(), Some("from db"));
    }
}
