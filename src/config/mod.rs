//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `IDEA_AGENT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use idea_agent::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod checkpoint;
mod credentials;
mod database;
mod engine;
mod error;
mod knowledge;
mod redis;
mod server;

pub use ai::AiConfig;
pub use checkpoint::{CheckpointBackend, CheckpointConfig};
pub use credentials::CredentialsConfig;
pub use database::DatabaseConfig;
pub use engine::{EngineConfig, LockPolicy};
pub use error::{ConfigError, ValidationError};
pub use knowledge::KnowledgeConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development setup (file checkpoints, cache-only artifacts).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    /// Operator application's MySQL database (artifact write-behind)
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `IDEA_AGENT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `IDEA_AGENT__SERVER__PORT=8001` -> `server.port = 8001`
    /// - `IDEA_AGENT__ENGINE__MAX_ITERATIONS=5` -> `engine.max_iterations = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("IDEA_AGENT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.engine.validate()?;
        self.redis.validate()?;
        self.database.validate()?;
        self.knowledge.validate()?;
        self.credentials.validate()?;

        if self.checkpoint.backend == CheckpointBackend::Redis && self.redis.url().is_none() {
            return Err(ValidationError::MissingRequired("IDEA_AGENT__REDIS__URL"));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
