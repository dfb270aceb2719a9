//! Human-visible projection of a turn history.

use serde::{Deserialize, Serialize};

use super::turn::Turn;

/// Speaker of a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRole {
    User,
    Assistant,
}

/// One conversational line as shown to a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub content: String,
}

/// Projects a history onto the conversational transcript.
///
/// Tool results are dropped, tool requests are stripped from agent replies,
/// and agent replies with no text (pure tool calls) are omitted.
pub fn project(turns: &[Turn]) -> Vec<TranscriptEntry> {
    turns
        .iter()
        .filter_map(|turn| match turn {
            Turn::Human(human) => Some(TranscriptEntry {
                role: TranscriptRole::User,
                content: human.content.clone(),
            }),
            Turn::AgentReply(reply) if !reply.content.trim().is_empty() => Some(TranscriptEntry {
                role: TranscriptRole::Assistant,
                content: reply.content.clone(),
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::turn::{AgentReply, ToolRequest, ToolResult};
    use crate::domain::foundation::{AgentId, ToolCallId};
    use serde_json::json;

    #[test]
    fn projection_keeps_only_conversational_text() {
        let agent = AgentId::new("requirement-gathering").unwrap();
        let request = ToolRequest::new(ToolCallId::new("c1"), "save_requirements", json!({}));
        let turns = vec![
            Turn::human("I want a shop"),
            AgentReply::with_tools(agent.clone(), "", vec![request.clone()]).into(),
            ToolResult::success(&request, json!("saved")).into(),
            AgentReply::text(agent, "Requirements captured.").into(),
        ];

        let transcript = project(&turns);

        assert_eq!(
            transcript,
            vec![
                TranscriptEntry {
                    role: TranscriptRole::User,
                    content: "I want a shop".to_string()
                },
                TranscriptEntry {
                    role: TranscriptRole::Assistant,
                    content: "Requirements captured.".to_string()
                },
            ]
        );
    }

    #[test]
    fn reply_text_survives_when_it_also_requested_tools() {
        let agent = AgentId::new("developer").unwrap();
        let request = ToolRequest::new(ToolCallId::new("c1"), "search_knowledge_base", json!({}));
        let turns = vec![AgentReply::with_tools(agent, "Let me look that up.", vec![request]).into()];

        let transcript = project(&turns);

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].content, "Let me look that up.");
    }

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&TranscriptRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&TranscriptRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
