//! Knowledge base (retrieval service) configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeConfig {
    /// Retrieval service base URL; search reports itself unavailable when unset
    pub base_url: Option<String>,

    /// Passages returned per search
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl KnowledgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.base_url() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidServiceUrl("knowledge.base_url"));
            }
        }
        if self.top_k == 0 || self.top_k > 50 {
            return Err(ValidationError::InvalidTopK);
        }
        Ok(())
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            top_k: default_top_k(),
            index_name: default_index_name(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

fn default_index_name() -> String {
    "laravel_docs".to_string()
}

fn default_timeout() -> u64 {
    30
}
