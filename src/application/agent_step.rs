//! Agent Step - one invocation of an agent's reasoning capability.
//!
//! Input history must already satisfy the tool-result protocol. The reply
//! comes back as an [`AgentReply`] whose tool requests all carry ids that are
//! unique within the conversation.

use std::collections::HashSet;

use crate::domain::agents::AgentProfile;
use crate::domain::conversation::{satisfies_protocol, AgentReply, ToolRequest, Turn};
use crate::domain::foundation::ToolCallId;
use crate::domain::tools::ToolDefinition;
use crate::ports::{ReasoningCapability, ReasoningRequest, RequestMetadata};

use super::errors::EngineError;

/// Generation defaults applied when the profile does not set its own.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentStep {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl AgentStep {
    pub fn new(max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }

    /// Builds the request an agent sees for `history`.
    pub fn request(
        &self,
        profile: &AgentProfile,
        history: &[Turn],
        tools: Vec<ToolDefinition>,
        metadata: RequestMetadata,
    ) -> ReasoningRequest {
        let mut request = ReasoningRequest::new(metadata.with_agent(profile.id.clone()))
            .with_system_prompt(profile.system_prompt.clone())
            .with_history(history.to_vec())
            .with_tools(tools);
        if let Some(max) = profile.max_tokens.or(self.max_tokens) {
            request = request.with_max_tokens(max);
        }
        if let Some(temperature) = profile.temperature.or(self.temperature) {
            request = request.with_temperature(temperature);
        }
        request
    }

    /// Invokes the agent once.
    ///
    /// # Errors
    /// - `Internal` when `history` has unanswered tool requests
    /// - `Configuration` / `Transient` classified from the provider error
    pub async fn run(
        &self,
        capability: &dyn ReasoningCapability,
        profile: &AgentProfile,
        history: &[Turn],
        tools: Vec<ToolDefinition>,
        metadata: RequestMetadata,
    ) -> Result<AgentReply, EngineError> {
        if !satisfies_protocol(history) {
            return Err(EngineError::internal(
                "history has unanswered tool requests; repair must run first",
            ));
        }

        let request = self.request(profile, history, tools, metadata);
        let response = capability.reason(request).await?;

        tracing::debug!(
            agent = %profile.id,
            model = %response.model,
            tool_calls = response.tool_calls.len(),
            finish_reason = ?response.finish_reason,
            total_tokens = response.usage.total_tokens,
            "Agent step completed"
        );

        let mut taken = used_call_ids(history);
        let requests = response
            .tool_calls
            .into_iter()
            .map(|call| {
                let id = match call.id.map(ToolCallId::new) {
                    Some(id) if !id.is_blank() && !taken.contains(&id) => id,
                    _ => fresh_id(&taken),
                };
                taken.insert(id.clone());
                ToolRequest::new(id, call.name, call.arguments)
            })
            .collect();

        Ok(AgentReply::with_tools(profile.id.clone(), response.content, requests))
    }
}

fn used_call_ids(history: &[Turn]) -> HashSet<ToolCallId> {
    history
        .iter()
        .flat_map(|turn| match turn {
            Turn::AgentReply(reply) => reply.tool_requests.iter().map(|r| r.id.clone()).collect(),
            Turn::ToolResult(result) => vec![result.request_id.clone()],
            Turn::Human(_) => Vec::new(),
        })
        .collect()
}

fn fresh_id(taken: &HashSet<ToolCallId>) -> ToolCallId {
    loop {
        let id = ToolCallId::generate();
        if !taken.contains(&id) {
            return id;
        }
    }
}
