//! Conversation engine configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// What happens to a message for a conversation that is already mid-turn.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LockPolicy {
    /// Queue behind the in-flight turn.
    #[default]
    Wait,
    /// Fail fast with a busy error.
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Agent invocations allowed per inbound human message
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub lock_policy: LockPolicy,

    /// YAML document declaring agents and the routing table; the built-in
    /// two-agent workflow is used when absent.
    pub workflow_file: Option<PathBuf>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_iterations == 0 || self.max_iterations > 100 {
            return Err(ValidationError::InvalidMaxIterations);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            lock_policy: LockPolicy::default(),
            workflow_file: None,
        }
    }
}

fn default_max_iterations() -> u32 {
    10
}
