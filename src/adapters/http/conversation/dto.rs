//! Request and response bodies for the conversation endpoints.

use serde::{Deserialize, Serialize};

use crate::application::TurnOutcome;
use crate::domain::foundation::ValidationError;
use crate::domain::tools::ArtifactKind;
use crate::ports::{ProviderKind, ProviderSettings};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Provider choice sent by the caller; wins over stored and server keys.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfigDto {
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    pub model: Option<String>,
}

impl ProviderConfigDto {
    /// Settings for the resolver. A blank key means "not supplied".
    pub fn into_settings(self) -> Result<Option<ProviderSettings>, ValidationError> {
        if self.api_key.trim().is_empty() {
            return Ok(None);
        }
        let kind: ProviderKind = self.provider.parse()?;
        let mut settings = ProviderSettings::new(kind, self.api_key.trim());
        if let Some(model) = self.model.filter(|m| !m.trim().is_empty()) {
            settings = settings.with_model(model);
        }
        Ok(Some(settings))
    }
}

/// POST /ask
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub thread_id: Option<String>,
    pub user_id: Option<i64>,
    pub provider_config: Option<ProviderConfigDto>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArtifacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
    pub thread_id: String,
    pub status: String,
    pub active_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_artifacts: Option<ExtractedArtifacts>,
}

impl From<TurnOutcome> for AskResponse {
    fn from(outcome: TurnOutcome) -> Self {
        // Later saves of the same kind replace earlier ones.
        let extracted = outcome
            .artifacts
            .into_iter()
            .fold(None::<ExtractedArtifacts>, |acc, artifact| {
                let mut acc = acc.unwrap_or_default();
                match artifact.kind {
                    ArtifactKind::Requirements => acc.requirements = Some(artifact.content),
                    ArtifactKind::Solution => acc.solution = Some(artifact.content),
                }
                Some(acc)
            });

        Self {
            response: outcome.response,
            thread_id: outcome.conversation_id.to_string(),
            status: outcome.status.as_str().to_string(),
            active_agent: outcome.active_agent.to_string(),
            extracted_artifacts: extracted,
        }
    }
}
