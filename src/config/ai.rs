//! AI provider configuration
//!
//! Server-level keys are the last resort: per-request provider settings and
//! per-user credentials win over them.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::ports::{ModelProfile, ProviderKind};

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Provider tried first when both server keys are present
    #[serde(default = "default_provider")]
    pub primary_provider: ProviderKind,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    #[serde(default = "default_openai_publish_model")]
    pub openai_publish_model: String,

    #[serde(default = "default_anthropic_publish_model")]
    pub anthropic_publish_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Conversation token limit; providers fall back to their own default.
    pub max_tokens: Option<u32>,

    /// Conversation sampling temperature
    pub temperature: Option<f32>,

    #[serde(default = "default_publish_max_tokens")]
    pub publish_max_tokens: u32,

    #[serde(default = "default_publish_temperature")]
    pub publish_temperature: f32,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Server key for `kind`, if configured.
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::OpenAI => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    /// Default model name for a provider and request profile.
    pub fn model_for(&self, kind: ProviderKind, profile: ModelProfile) -> &str {
        match (kind, profile) {
            (ProviderKind::OpenAI, ModelProfile::Conversation) => &self.openai_model,
            (ProviderKind::OpenAI, ModelProfile::Publishing) => &self.openai_publish_model,
            (ProviderKind::Anthropic, ModelProfile::Conversation) => &self.anthropic_model,
            (ProviderKind::Anthropic, ModelProfile::Publishing) => &self.anthropic_publish_model,
        }
    }

    /// Validate AI configuration
    ///
    /// No key is required here: users may bring their own.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        let temperatures = [self.temperature, Some(self.publish_temperature)];
        if temperatures
            .iter()
            .flatten()
            .any(|t| !(0.0..=2.0).contains(t))
        {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == Some(0) || self.publish_max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            primary_provider: default_provider(),
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            openai_publish_model: default_openai_publish_model(),
            anthropic_publish_model: default_anthropic_publish_model(),
            timeout_secs: default_timeout(),
            max_tokens: None,
            temperature: None,
            publish_max_tokens: default_publish_max_tokens(),
            publish_temperature: default_publish_temperature(),
        }
    }
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenAI
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20240620".to_string()
}

fn default_openai_publish_model() -> String {
    "gpt-4o".to_string()
}

fn default_anthropic_publish_model() -> String {
    "claude-opus-4-20250514".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_publish_max_tokens() -> u32 {
    16000
}

fn default_publish_temperature() -> f32 {
    0.3
}
