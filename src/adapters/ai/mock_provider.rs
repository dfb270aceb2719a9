//! Mock reasoning capability for testing.
//!
//! Scripted replies are consumed in order; once the script runs out the
//! fallback reply is repeated. Every request is recorded for verification.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_tool_call("save_requirements", json!({"requirements": "R"}))
//!     .with_response("Here is the plan.");
//!
//! let response = provider.reason(request).await?;
//! assert_eq!(response.tool_calls[0].name, "save_requirements");
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, ProposedToolCall, ProviderInfo, ReasoningCapability, ReasoningRequest,
    ReasoningResponse, TokenUsage,
};

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Reply(ReasoningResponse),
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    NotConfigured { message: String },
    AuthenticationFailed,
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::NotConfigured { message } => AIError::not_configured(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

/// Mock reasoning capability.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    fallback: MockResponse,
    info: ProviderInfo,
    delay: Duration,
    calls: Arc<Mutex<Vec<ReasoningRequest>>>,
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

// A panicking test must not poison the script for the next assertion.
fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: MockResponse::Reply(Self::text_reply("Mock response")),
            info: ProviderInfo::new("mock", "mock-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn text_reply(content: impl Into<String>) -> ReasoningResponse {
        let mut reply = ReasoningResponse::text("mock-model-1", content);
        reply.usage = TokenUsage::new(10, 20);
        reply
    }

    /// Queues a plain conversational reply.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.with_reply(Self::text_reply(content))
    }

    /// Queues a reply requesting one tool, with a provider-assigned id.
    pub fn with_tool_call(self, name: impl Into<String>, arguments: Value) -> Self {
        let id = format!("call_mock_{}", guard(&self.responses).len());
        self.with_reply(
            Self::text_reply("").with_tool_call(ProposedToolCall::new(Some(id), name, arguments)),
        )
    }

    /// Queues an arbitrary reply.
    pub fn with_reply(self, reply: ReasoningResponse) -> Self {
        guard(&self.responses).push_back(MockResponse::Reply(reply));
        self
    }

    pub fn with_error(self, error: MockError) -> Self {
        guard(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Reply repeated once the script is exhausted.
    pub fn with_fallback(mut self, fallback: MockResponse) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        guard(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<ReasoningRequest> {
        guard(&self.calls).clone()
    }

    fn next_response(&self) -> MockResponse {
        guard(&self.responses)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl ReasoningCapability for MockAIProvider {
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, AIError> {
        guard(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Reply(reply) => Ok(reply),
            MockResponse::Error(error) => Err(error.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;
    use crate::ports::{FinishReason, RequestMetadata};
    use serde_json::json;

    fn request() -> ReasoningRequest {
        ReasoningRequest::new(RequestMetadata::new(ConversationId::generate(), "trace"))
    }

    #[tokio::test]
    async fn returns_scripted_responses_in_order() {
        let provider = MockAIProvider::new()
            .with_tool_call("save_requirements", json!({"requirements": "R"}))
            .with_response("second");

        let first = provider.reason(request()).await.unwrap();
        assert_eq!(first.finish_reason, FinishReason::ToolUse);
        assert_eq!(first.tool_calls[0].name, "save_requirements");

        let second = provider.reason(request()).await.unwrap();
        assert_eq!(second.content, "second");
    }

    #[tokio::test]
    async fn repeats_fallback_when_script_runs_out() {
        let provider = MockAIProvider::new();
        assert_eq!(provider.reason(request()).await.unwrap().content, "Mock response");
        assert_eq!(provider.reason(request()).await.unwrap().content, "Mock response");
    }

    #[tokio::test]
    async fn injects_errors() {
        let provider = MockAIProvider::new().with_error(MockError::AuthenticationFailed);
        let err = provider.reason(request()).await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn records_calls() {
        let provider = MockAIProvider::new();
        provider
            .reason(request().with_system_prompt("prompt"))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(
            provider.get_calls()[0].system_prompt.as_deref(),
            Some("prompt")
        );
    }
}
