//! Turn value objects.
//!
//! A conversation history is an ordered list of [`Turn`]s. Tool requests ride
//! inside the agent reply that proposed them; tool results are turns of their
//! own, correlated back to the request by [`ToolCallId`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{AgentId, ToolCallId};

/// One entry in a conversation's ordered history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    Human(HumanTurn),
    AgentReply(AgentReply),
    ToolResult(ToolResult),
}

/// Discriminant of a [`Turn`], used by routing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnKind {
    Human,
    AgentReply,
    ToolResult,
}

impl Turn {
    pub fn human(content: impl Into<String>) -> Self {
        Turn::Human(HumanTurn {
            content: content.into(),
        })
    }

    pub fn kind(&self) -> TurnKind {
        match self {
            Turn::Human(_) => TurnKind::Human,
            Turn::AgentReply(_) => TurnKind::AgentReply,
            Turn::ToolResult(_) => TurnKind::ToolResult,
        }
    }

    pub fn as_agent_reply(&self) -> Option<&AgentReply> {
        match self {
            Turn::AgentReply(reply) => Some(reply),
            _ => None,
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        match self {
            Turn::ToolResult(result) => Some(result),
            _ => None,
        }
    }
}

impl From<AgentReply> for Turn {
    fn from(reply: AgentReply) -> Self {
        Turn::AgentReply(reply)
    }
}

impl From<ToolResult> for Turn {
    fn from(result: ToolResult) -> Self {
        Turn::ToolResult(result)
    }
}

/// Free-text input from the human operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanTurn {
    pub content: String,
}

/// Output of one agent step: text plus zero or more tool requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub agent: AgentId,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requests: Vec<ToolRequest>,
}

impl AgentReply {
    pub fn text(agent: AgentId, content: impl Into<String>) -> Self {
        Self {
            agent,
            content: content.into(),
            tool_requests: Vec::new(),
        }
    }

    pub fn with_tools(agent: AgentId, content: impl Into<String>, requests: Vec<ToolRequest>) -> Self {
        Self {
            agent,
            content: content.into(),
            tool_requests: requests,
        }
    }

    pub fn has_tool_requests(&self) -> bool {
        !self.tool_requests.is_empty()
    }

    /// Finds the request with the given id.
    pub fn request(&self, id: &ToolCallId) -> Option<&ToolRequest> {
        self.tool_requests.iter().find(|r| &r.id == id)
    }
}

/// A proposed invocation of a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: ToolCallId,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolRequest {
    pub fn new(id: ToolCallId, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id,
            name: name.into(),
            arguments,
        }
    }
}

/// The outcome of one tool request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub request_id: ToolCallId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    pub payload: Value,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(request: &ToolRequest, payload: Value) -> Self {
        Self {
            request_id: request.id.clone(),
            tool_name: Some(request.name.clone()),
            payload,
            is_error: false,
        }
    }

    pub fn error(request: &ToolRequest, message: impl Into<String>) -> Self {
        Self {
            request_id: request.id.clone(),
            tool_name: Some(request.name.clone()),
            payload: serde_json::json!({ "error": message.into() }),
            is_error: true,
        }
    }

    /// Text form of the payload as shown to a model or a human.
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent() -> AgentId {
        AgentId::new("developer").unwrap()
    }

    #[test]
    fn turns_serialize_with_kind_tag() {
        let turn = Turn::human("hello");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value, json!({"kind": "human", "content": "hello"}));
    }

    #[test]
    fn agent_reply_without_tools_omits_request_list() {
        let turn: Turn = AgentReply::text(agent(), "hi").into();
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["kind"], "agent_reply");
        assert!(value.get("tool_requests").is_none());
    }

    #[test]
    fn tool_result_constructors_carry_request_identity() {
        let request = ToolRequest::new(ToolCallId::new("call_1"), "save_solution", json!({}));
        let ok = ToolResult::success(&request, json!("saved"));
        assert_eq!(ok.request_id.as_str(), "call_1");
        assert_eq!(ok.tool_name.as_deref(), Some("save_solution"));
        assert!(!ok.is_error);

        let failed = ToolResult::error(&request, "boom");
        assert!(failed.is_error);
        assert_eq!(failed.payload, json!({"error": "boom"}));
    }

    #[test]
    fn payload_text_unwraps_plain_strings() {
        let request = ToolRequest::new(ToolCallId::new("c"), "t", json!({}));
        assert_eq!(ToolResult::success(&request, json!("done")).payload_text(), "done");
        assert_eq!(
            ToolResult::success(&request, json!({"a": 1})).payload_text(),
            "{\"a\":1}"
        );
    }

    #[test]
    fn reply_finds_request_by_id() {
        let reply = AgentReply::with_tools(
            agent(),
            "",
            vec![ToolRequest::new(ToolCallId::new("x"), "save_solution", json!({}))],
        );
        assert!(reply.request(&ToolCallId::new("x")).is_some());
        assert!(reply.request(&ToolCallId::new("y")).is_none());
    }
}
