//! Ask command handler.
//!
//! Validates the raw request fields, fixes the thread id up front so error
//! answers can name it, then hands the message to the driver. The turn runs
//! as its own task, so a dropped caller never abandons it mid-step.

use std::sync::Arc;

use crate::application::driver::{ConversationDriver, TurnOutcome, TurnRequest};
use crate::application::errors::EngineError;
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::ProviderSettings;

/// Command to send a human message to a conversation.
#[derive(Debug, Clone)]
pub struct AskCommand {
    pub question: String,
    /// Client-supplied thread id; a new one is generated when absent.
    pub thread_id: Option<String>,
    pub user_id: Option<i64>,
    pub provider: Option<ProviderSettings>,
}

impl AskCommand {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            thread_id: None,
            user_id: None,
            provider: None,
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Failure of an ask, carrying the thread id when one is known.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct AskError {
    pub thread_id: Option<String>,
    pub error: EngineError,
}

pub struct AskHandler {
    driver: Arc<ConversationDriver>,
}

impl AskHandler {
    pub fn new(driver: Arc<ConversationDriver>) -> Self {
        Self { driver }
    }

    pub async fn handle(&self, cmd: AskCommand) -> Result<TurnOutcome, AskError> {
        let thread_id = match cmd.thread_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => ConversationId::parse(raw).map_err(|e| AskError {
                thread_id: Some(raw.to_string()),
                error: e.into(),
            })?,
            _ => ConversationId::generate(),
        };

        let mut request = TurnRequest::new(cmd.question).in_conversation(thread_id.clone());
        if let Some(user) = cmd.user_id {
            request = request.from_user(UserId::new(user));
        }
        if let Some(settings) = cmd.provider {
            request = request.with_provider(settings);
        }

        let driver = Arc::clone(&self.driver);
        let turn = tokio::spawn(async move { driver.handle_turn(request).await });

        let result = match turn.await {
            Ok(result) => result,
            Err(join_error) => {
                tracing::error!(conversation_id = %thread_id, error = %join_error, "Turn task failed");
                Err(EngineError::internal(format!("turn task failed: {}", join_error)))
            }
        };
        result.map_err(|error| AskError {
            thread_id: Some(thread_id.to_string()),
            error,
        })
    }
}
