//! GetArtifactsHandler - latest requirements and solution of a conversation.

use std::sync::Arc;

use serde::Serialize;

use crate::application::errors::EngineError;
use crate::domain::foundation::ConversationId;
use crate::ports::ArtifactSink;

#[derive(Debug, Clone)]
pub struct GetArtifactsQuery {
    pub thread_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactsView {
    pub thread_id: String,
    pub requirements: Option<String>,
    pub solution: Option<String>,
}

pub struct GetArtifactsHandler {
    sink: Arc<dyn ArtifactSink>,
}

impl GetArtifactsHandler {
    pub fn new(sink: Arc<dyn ArtifactSink>) -> Self {
        Self { sink }
    }

    pub async fn handle(&self, query: GetArtifactsQuery) -> Result<ArtifactsView, EngineError> {
        let id = ConversationId::parse(query.thread_id)?;
        let stored = self.sink.load_artifacts(&id).await?;
        Ok(ArtifactsView {
            thread_id: id.to_string(),
            requirements: stored.requirements,
            solution: stored.solution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::ArtifactCache;
    use crate::domain::tools::Artifact;

    #[tokio::test]
    async fn returns_saved_documents() {
        let cache = Arc::new(ArtifactCache::new());
        let id = ConversationId::parse("t-1").unwrap();
        cache
            .upsert_artifact(&id, None, &Artifact::requirements("R"))
            .await
            .unwrap();

        let view = GetArtifactsHandler::new(cache)
            .handle(GetArtifactsQuery {
                thread_id: "t-1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(view.requirements.as_deref(), Some("R"));
        assert!(view.solution.is_none());
    }
}
