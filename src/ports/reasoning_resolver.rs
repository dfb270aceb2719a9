//! Reasoning Resolver Port - picks the model that answers a request.
//!
//! Credentials are per user, so the capability is resolved per inbound
//! request rather than wired once at startup.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::Secret;
use serde::{Deserialize, Serialize};

use super::reasoning::{AIError, ReasoningCapability};
use crate::domain::foundation::{UserId, ValidationError};

/// Remediation shown when no model configuration can be found.
pub const MISSING_CONFIGURATION_MESSAGE: &str = "AI configuration not found. \
Please configure your AI settings with your OpenAI or Anthropic API key.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unsupported AI provider '{}'", other),
            )),
        }
    }
}

/// A provider plus the key to call it with.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: Secret<String>,
    /// Overrides the profile's default model.
    pub model: Option<String>,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: Secret::new(api_key.into()),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Which family of model settings a request wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelProfile {
    /// Multi-turn agent conversation.
    Conversation,
    /// One-shot long-form solution document.
    Publishing,
}

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub user_id: Option<UserId>,
    /// Settings carried on the request itself; win over everything else.
    pub explicit: Option<ProviderSettings>,
    pub profile: ModelProfile,
}

impl ResolveRequest {
    pub fn conversation(user_id: Option<UserId>, explicit: Option<ProviderSettings>) -> Self {
        Self {
            user_id,
            explicit,
            profile: ModelProfile::Conversation,
        }
    }

    pub fn publishing(user_id: Option<UserId>, explicit: Option<ProviderSettings>) -> Self {
        Self {
            user_id,
            explicit,
            profile: ModelProfile::Publishing,
        }
    }
}

#[async_trait]
pub trait ReasoningResolver: Send + Sync {
    /// # Errors
    /// `AIError::NotConfigured` when no source yields usable settings.
    async fn resolve(
        &self,
        request: &ResolveRequest,
    ) -> Result<Arc<dyn ReasoningCapability>, AIError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!(" anthropic ".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert!("gemini".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn settings_keep_key_secret() {
        let settings = ProviderSettings::new(ProviderKind::OpenAI, "sk-test").with_model("gpt-4o");
        assert_eq!(settings.api_key.expose_secret(), "sk-test");
        assert!(!format!("{:?}", settings).contains("sk-test"));
    }
}
