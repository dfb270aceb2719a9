//! GetConversationHandler - query for the human-visible transcript.

use std::sync::Arc;

use serde::Serialize;

use crate::application::errors::EngineError;
use crate::domain::conversation::{project, TranscriptEntry};
use crate::domain::foundation::ConversationId;
use crate::ports::CheckpointStore;

#[derive(Debug, Clone)]
pub struct GetConversationQuery {
    pub thread_id: String,
}

/// Transcript of one conversation. Unknown threads yield an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationView {
    pub thread_id: String,
    pub messages: Vec<TranscriptEntry>,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_hint: Option<String>,
}

pub struct GetConversationHandler {
    store: Arc<dyn CheckpointStore>,
}

impl GetConversationHandler {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetConversationQuery) -> Result<ConversationView, EngineError> {
        let id = ConversationId::parse(query.thread_id)?;

        let view = match self.store.find(&id).await? {
            Some(state) => {
                let messages = project(&state.turns);
                ConversationView {
                    thread_id: id.to_string(),
                    message_count: messages.len(),
                    messages,
                    active_agent: Some(state.active_agent.to_string()),
                    routing_hint: Some(state.routing_hint.to_string()),
                }
            }
            None => ConversationView {
                thread_id: id.to_string(),
                messages: Vec::new(),
                message_count: 0,
                active_agent: None,
                routing_hint: None,
            },
        };
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryCheckpointStore;
    use crate::domain::conversation::{
        AgentReply, ConversationState, ToolRequest, ToolResult, TranscriptRole, Turn,
    };
    use crate::domain::foundation::{AgentId, ToolCallId};
    use serde_json::json;

    #[tokio::test]
    async fn transcript_hides_tool_traffic() {
        let store = InMemoryCheckpointStore::new();
        let id = ConversationId::parse("thread-1").unwrap();
        let agent = AgentId::new("requirement-gathering").unwrap();
        let request = ToolRequest::new(ToolCallId::new("c1"), "save_requirements", json!({}));
        let mut state = ConversationState::new(id.clone(), agent.clone(), None);
        state.turns = vec![
            Turn::human("I want a blog"),
            AgentReply::with_tools(agent.clone(), "", vec![request.clone()]).into(),
            ToolResult::success(&request, json!("Requirements saved successfully.")).into(),
            AgentReply::text(agent, "Captured.").into(),
        ];
        store.seed(state).await;

        let view = GetConversationHandler::new(Arc::new(store))
            .handle(GetConversationQuery {
                thread_id: "thread-1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(view.message_count, 2);
        assert_eq!(view.messages[0].role, TranscriptRole::User);
        assert_eq!(view.messages[1].content, "Captured.");
        assert_eq!(view.active_agent.as_deref(), Some("requirement-gathering"));
    }

    #[tokio::test]
    async fn unknown_thread_is_empty() {
        let view = GetConversationHandler::new(Arc::new(InMemoryCheckpointStore::new()))
            .handle(GetConversationQuery {
                thread_id: "nope".to_string(),
            })
            .await
            .unwrap();

        assert!(view.messages.is_empty());
        assert_eq!(view.message_count, 0);
        assert!(view.routing_hint.is_none());
    }

    #[tokio::test]
    async fn invalid_thread_id_is_rejected() {
        let err = GetConversationHandler::new(Arc::new(InMemoryCheckpointStore::new()))
            .handle(GetConversationQuery {
                thread_id: "a b".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), "invalid_request");
    }
}
