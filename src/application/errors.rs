//! Engine error taxonomy.
//!
//! Every collaborator failure is classified here at the driver boundary so the
//! HTTP layer only ever sees one of these variants.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, ValidationError};
use crate::ports::{AIError, ArtifactSinkError, CheckpointError};

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Missing or rejected model credentials. Not retryable.
    #[error("{0}")]
    Configuration(String),

    /// A collaborator failed in a way that a retry may fix.
    #[error("{0}")]
    Transient(String),

    #[error("Agent loop stopped after {limit} iterations without waiting for input")]
    LoopBoundExceeded { limit: u32 },

    #[error("Conversation {0} is already processing a message")]
    Busy(ConversationId),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Wire status reported to callers.
    pub fn status(&self) -> &'static str {
        match self {
            EngineError::Configuration(_) => "configuration_error",
            EngineError::Transient(_) => "transient_error",
            EngineError::LoopBoundExceeded { .. } => "loop_bound_exceeded",
            EngineError::Busy(_) => "busy",
            EngineError::InvalidInput(_) => "invalid_request",
            EngineError::Internal(_) => "internal_error",
        }
    }

    /// True when resending the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transient(_) | EngineError::Busy(_))
    }
}

impl From<AIError> for EngineError {
    fn from(err: AIError) -> Self {
        if err.is_configuration() {
            match err {
                AIError::AuthenticationFailed => EngineError::Configuration(
                    "The AI provider rejected the configured API key. \
Please check your AI settings."
                        .to_string(),
                ),
                other => EngineError::Configuration(other.to_string()),
            }
        } else {
            EngineError::Transient(format!("AI provider error: {}", err))
        }
    }
}

impl From<CheckpointError> for EngineError {
    fn from(err: CheckpointError) -> Self {
        match err {
            CheckpointError::Unavailable(_) => EngineError::Transient(err.to_string()),
            CheckpointError::NotFound(_) | CheckpointError::Serialization(_) => {
                EngineError::Internal(err.to_string())
            }
        }
    }
}

impl From<ArtifactSinkError> for EngineError {
    fn from(err: ArtifactSinkError) -> Self {
        match err {
            ArtifactSinkError::Unavailable(_) => EngineError::Transient(err.to_string()),
            ArtifactSinkError::Database(_) => EngineError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::InvalidInput(err.to_string())
    }
}
