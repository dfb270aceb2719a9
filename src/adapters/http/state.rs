//! Shared state handed to every HTTP handler.

use std::sync::Arc;

use crate::application::handlers::{
    AskHandler, CancelTurnHandler, GetArtifactsHandler, GetConversationHandler,
    PublishSolutionHandler,
};
use crate::application::ConversationDriver;
use crate::config::AiConfig;
use crate::ports::{ArtifactSink, ReasoningResolver};

#[derive(Clone)]
pub struct AppState {
    pub service: &'static str,
    pub ask: Arc<AskHandler>,
    pub conversations: Arc<GetConversationHandler>,
    pub cancel: Arc<CancelTurnHandler>,
    pub artifacts: Arc<GetArtifactsHandler>,
    pub publish: Arc<PublishSolutionHandler>,
}

impl AppState {
    /// Wires every handler around one driver.
    ///
    /// `sink` is the same artifact sink the driver's tools write through, so
    /// artifact reads and publish fallbacks see what the conversation saved.
    pub fn new(
        driver: Arc<ConversationDriver>,
        resolver: Arc<dyn ReasoningResolver>,
        sink: Arc<dyn ArtifactSink>,
        ai: &AiConfig,
    ) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME"),
            conversations: Arc::new(GetConversationHandler::new(driver.store().clone())),
            cancel: Arc::new(CancelTurnHandler::new(driver.clone())),
            artifacts: Arc::new(GetArtifactsHandler::new(sink.clone())),
            publish: Arc::new(PublishSolutionHandler::new(resolver, sink, ai)),
            ask: Arc::new(AskHandler::new(driver)),
        }
    }
}
