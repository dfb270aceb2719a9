//! Reasoning Port - Interface for language-model providers.
//!
//! The engine hands a provider the agent's system prompt, the typed turn
//! history and the tools on offer; the provider answers with text and/or
//! proposed tool calls. Translating turns into each vendor's wire format is
//! the adapter's job.
//!
//! # Example
//!
//! ```ignore
//! #[async_trait]
//! impl ReasoningCapability for EchoProvider {
//!     async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, AIError> {
//!         Ok(ReasoningResponse::text("echo", "Hello!"))
//!     }
//!
//!     fn provider_info(&self) -> ProviderInfo {
//!         ProviderInfo::new("echo", "echo-1")
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::conversation::Turn;
use crate::domain::foundation::{AgentId, ConversationId, UserId};
use crate::domain::tools::ToolDefinition;

/// Port for language-model invocations.
#[async_trait]
pub trait ReasoningCapability: Send + Sync {
    /// Produce one reply for the given history.
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, AIError>;

    /// Get provider information (name, model).
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for one model reply.
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub system_prompt: Option<String>,
    /// Conversation so far; satisfies the tool-result protocol.
    pub history: Vec<Turn>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub metadata: RequestMetadata,
}

impl ReasoningRequest {
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            system_prompt: None,
            history: Vec::new(),
            tools: Vec::new(),
            max_tokens: None,
            temperature: None,
            metadata,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.history.push(turn);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Request metadata for tracing.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub conversation_id: ConversationId,
    pub user_id: Option<UserId>,
    pub agent: Option<AgentId>,
    pub trace_id: String,
}

impl RequestMetadata {
    pub fn new(conversation_id: ConversationId, trace_id: impl Into<String>) -> Self {
        Self {
            conversation_id,
            user_id: None,
            agent: None,
            trace_id: trace_id.into(),
        }
    }

    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_agent(mut self, agent: AgentId) -> Self {
        self.agent = Some(agent);
        self
    }
}

/// A tool call proposed by the model.
///
/// Providers normally supply an id; the agent step fills in missing or
/// duplicate ids before the call enters the history.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedToolCall {
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
}

impl ProposedToolCall {
    pub fn new(id: Option<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id,
            name: name.into(),
            arguments,
        }
    }
}

/// Model reply.
#[derive(Debug, Clone)]
pub struct ReasoningResponse {
    pub content: String,
    pub tool_calls: Vec<ProposedToolCall>,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
}

impl ReasoningResponse {
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            model: model.into(),
            usage: TokenUsage::default(),
            finish_reason: FinishReason::Stop,
        }
    }

    pub fn with_tool_call(mut self, call: ProposedToolCall) -> Self {
        self.tool_calls.push(call);
        self.finish_reason = FinishReason::ToolUse;
        self
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

/// Provider information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    /// No usable model configuration for the requester.
    #[error("{0}")]
    NotConfigured(String),

    /// API key rejected by the provider.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    #[error("context too long: {0}")]
    ContextTooLong(String),

    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl AIError {
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::NotConfigured(message.into())
    }

    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Errors the human can only fix by changing their AI settings.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AIError::NotConfigured(_) | AIError::AuthenticationFailed)
    }

    /// Returns true if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> RequestMetadata {
        RequestMetadata::new(ConversationId::generate(), "trace-1")
    }

    #[test]
    fn request_builder_works() {
        let request = ReasoningRequest::new(metadata())
            .with_system_prompt("Be helpful")
            .with_turn(Turn::human("Hello"))
            .with_max_tokens(100)
            .with_temperature(0.3);

        assert_eq!(request.history.len(), 1);
        assert_eq!(request.system_prompt.as_deref(), Some("Be helpful"));
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.3));
    }

    #[test]
    fn tool_call_marks_finish_reason() {
        let response = ReasoningResponse::text("m", "")
            .with_tool_call(ProposedToolCall::new(None, "save_solution", json!({})));
        assert_eq!(response.finish_reason, FinishReason::ToolUse);
        assert_eq!(response.tool_calls.len(), 1);
    }

    #[test]
    fn token_usage_calculates_total() {
        assert_eq!(TokenUsage::new(100, 50).total_tokens, 150);
    }

    #[test]
    fn configuration_errors_are_not_retryable() {
        let err = AIError::not_configured("missing key");
        assert!(err.is_configuration());
        assert!(!err.is_retryable());
        assert!(AIError::AuthenticationFailed.is_configuration());
    }

    #[test]
    fn network_errors_are_retryable() {
        assert!(AIError::network("reset").is_retryable());
        assert!(AIError::Timeout { timeout_secs: 5 }.is_retryable());
        assert!(!AIError::parse("bad json").is_retryable());
    }
}
