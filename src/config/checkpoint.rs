//! Checkpoint store configuration

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// Process memory; conversations do not survive a restart.
    Memory,
    /// One YAML document per conversation under `data_dir`.
    #[default]
    File,
    /// JSON values in Redis under `key_prefix`.
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointConfig {
    #[serde(default)]
    pub backend: CheckpointBackend,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: CheckpointBackend::default(),
            data_dir: default_data_dir(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/conversations")
}

fn default_key_prefix() -> String {
    "idea_agent:conversation:".to_string()
}
