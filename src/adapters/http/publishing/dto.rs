//! Request and response bodies for /publish and /republish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapters::http::conversation::ProviderConfigDto;
use crate::application::handlers::PublishSolutionResult;

#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub thread_id: String,
    /// Falls back to the thread's saved requirements when absent or blank.
    pub requirements: Option<String>,
    pub user_id: Option<i64>,
    pub provider_config: Option<ProviderConfigDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub thread_id: String,
    pub model_used: String,
    pub is_republish: bool,
    pub word_count: usize,
    pub char_count: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub solution: String,
    pub metadata: PublishMetadata,
}

impl From<PublishSolutionResult> for PublishResponse {
    fn from(result: PublishSolutionResult) -> Self {
        Self {
            solution: result.solution,
            metadata: PublishMetadata {
                thread_id: result.thread_id,
                model_used: result.model_used,
                is_republish: result.is_republish,
                word_count: result.word_count,
                char_count: result.char_count,
                generated_at: result.generated_at,
            },
        }
    }
}
