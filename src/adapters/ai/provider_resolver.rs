//! Per-request reasoning capability resolution.
//!
//! Settings are taken from, in order: the request's own provider config, the
//! user's stored AI settings, the server-level keys.

use async_trait::async_trait;
use std::sync::Arc;

use super::anthropic_provider::{AnthropicConfig, AnthropicProvider};
use super::openai_provider::{OpenAIConfig, OpenAIProvider};
use crate::config::AiConfig;
use crate::ports::{
    AIError, CredentialSource, ModelProfile, ProviderKind, ProviderSettings, ReasoningCapability,
    ReasoningResolver, ResolveRequest, MISSING_CONFIGURATION_MESSAGE,
};

pub struct ProviderResolver {
    ai: AiConfig,
    credentials: Option<Arc<dyn CredentialSource>>,
}

impl ProviderResolver {
    pub fn new(ai: AiConfig) -> Self {
        Self {
            ai,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    async fn settings_for(&self, request: &ResolveRequest) -> Option<ProviderSettings> {
        if let Some(explicit) = &request.explicit {
            return Some(explicit.clone());
        }

        if let (Some(user), Some(source)) = (request.user_id, &self.credentials) {
            match source.credentials_for(user).await {
                Ok(Some(settings)) => return Some(settings),
                Ok(None) => {
                    tracing::debug!(user_id = %user, "No stored AI settings for user");
                }
                Err(e) => {
                    tracing::warn!(user_id = %user, error = %e, "Credential lookup failed, using server keys");
                }
            }
        }

        self.server_settings()
    }

    /// Primary provider first, then whichever other key is configured.
    fn server_settings(&self) -> Option<ProviderSettings> {
        let secondary = match self.ai.primary_provider {
            ProviderKind::OpenAI => ProviderKind::Anthropic,
            ProviderKind::Anthropic => ProviderKind::OpenAI,
        };
        [self.ai.primary_provider, secondary]
            .into_iter()
            .find_map(|kind| {
                self.ai
                    .api_key(kind)
                    .map(|key| ProviderSettings::new(kind, key))
            })
    }

    fn build(
        &self,
        settings: ProviderSettings,
        profile: ModelProfile,
    ) -> Result<Arc<dyn ReasoningCapability>, AIError> {
        let model = settings
            .model
            .unwrap_or_else(|| self.ai.model_for(settings.kind, profile).to_string());

        Ok(match settings.kind {
            ProviderKind::OpenAI => Arc::new(OpenAIProvider::new(
                OpenAIConfig::from_secret(settings.api_key)
                    .with_model(model)
                    .with_timeout(self.ai.timeout()),
            )?),
            ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
                AnthropicConfig::from_secret(settings.api_key)
                    .with_model(model)
                    .with_timeout(self.ai.timeout()),
            )?),
        })
    }
}

#[async_trait]
impl ReasoningResolver for ProviderResolver {
    async fn resolve(
        &self,
        request: &ResolveRequest,
    ) -> Result<Arc<dyn ReasoningCapability>, AIError> {
        let settings = self
            .settings_for(request)
            .await
            .ok_or_else(|| AIError::not_configured(MISSING_CONFIGURATION_MESSAGE))?;

        let kind = settings.kind;
        let capability = self.build(settings, request.profile)?;
        tracing::debug!(
            provider = %kind,
            model = %capability.provider_info().model,
            profile = ?request.profile,
            "Resolved reasoning capability"
        );
        Ok(capability)
    }
}

/// Resolves every request to the same capability.
pub struct FixedResolver {
    capability: Arc<dyn ReasoningCapability>,
}

impl FixedResolver {
    pub fn new(capability: Arc<dyn ReasoningCapability>) -> Self {
        Self { capability }
    }
}

#[async_trait]
impl ReasoningResolver for FixedResolver {
    async fn resolve(
        &self,
        _request: &ResolveRequest,
    ) -> Result<Arc<dyn ReasoningCapability>, AIError> {
        Ok(self.capability.clone())
    }
}
