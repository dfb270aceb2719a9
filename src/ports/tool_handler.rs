//! Tool Handler Port - one side-effecting operation an agent may request.
//!
//! Handlers are registered by wire name in the dispatcher at startup. Each
//! handler owns its own idempotency (save tools upsert per conversation) and
//! any retry policy; the dispatcher never retries.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::{AgentId, ConversationId, UserId};
use crate::domain::tools::{Artifact, ToolDefinition};

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name, description and argument schema offered to the model.
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool.
    ///
    /// # Errors
    /// Any error becomes an error payload in the conversation; it never
    /// aborts the turn.
    async fn invoke(&self, arguments: &Value, context: &ToolContext) -> Result<ToolOutput, ToolExecutionError>;
}

/// Who is calling, for tools that key their side effects on the conversation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub conversation_id: ConversationId,
    pub user_id: Option<UserId>,
    pub agent: AgentId,
}

/// What a tool hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub payload: Value,
    /// Document captured by the tool, reported to the caller of `/ask`.
    pub artifact: Option<Artifact>,
}

impl ToolOutput {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            payload: Value::String(text.into()),
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifact = Some(artifact);
        self
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolExecutionError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool failed: {0}")]
    Failed(String),
}

impl ToolExecutionError {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Reads a required, non-blank string argument.
pub fn required_string<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolExecutionError> {
    match arguments.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err(ToolExecutionError::invalid_arguments(format!(
            "'{}' must not be empty",
            key
        ))),
        Some(_) => Err(ToolExecutionError::invalid_arguments(format!(
            "'{}' must be a string",
            key
        ))),
        None => Err(ToolExecutionError::invalid_arguments(format!(
            "missing required argument '{}'",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_string_accepts_present_text() {
        let args = json!({"query": "queues"});
        assert_eq!(required_string(&args, "query").unwrap(), "queues");
    }

    #[test]
    fn required_string_rejects_missing_blank_and_non_string() {
        assert!(required_string(&json!({}), "query").is_err());
        assert!(required_string(&json!({"query": "  "}), "query").is_err());
        let err = required_string(&json!({"query": 3}), "query").unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }

    #[test]
    fn tool_output_message_is_plain_string() {
        let output = ToolOutput::message("saved").with_artifact(Artifact::solution("plan"));
        assert_eq!(output.payload, json!("saved"));
        assert!(output.artifact.is_some());
    }
}
