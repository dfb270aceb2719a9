//! CancelTurnHandler - stops the running turn of a conversation.

use std::sync::Arc;

use serde::Serialize;

use crate::application::driver::ConversationDriver;
use crate::application::errors::EngineError;
use crate::domain::foundation::ConversationId;

#[derive(Debug, Clone)]
pub struct CancelTurnCommand {
    pub thread_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelTurnResult {
    pub thread_id: String,
    /// False when no turn was running.
    pub cancelled: bool,
}

pub struct CancelTurnHandler {
    driver: Arc<ConversationDriver>,
}

impl CancelTurnHandler {
    pub fn new(driver: Arc<ConversationDriver>) -> Self {
        Self { driver }
    }

    pub fn handle(&self, cmd: CancelTurnCommand) -> Result<CancelTurnResult, EngineError> {
        let id = ConversationId::parse(cmd.thread_id)?;
        let cancelled = self.driver.cancel(&id);
        Ok(CancelTurnResult {
            thread_id: id.to_string(),
            cancelled,
        })
    }
}
