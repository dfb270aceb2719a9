//! PublishSolution command handler.
//!
//! One-shot generation of the full technical implementation guide from a
//! finished requirements document. Runs outside the conversation loop but
//! resolves its model through the same resolver, with the publishing
//! profile (larger model, low temperature, long output).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::application::errors::EngineError;
use crate::config::AiConfig;
use crate::domain::conversation::Turn;
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{
    ArtifactSink, ProviderSettings, ReasoningRequest, ReasoningResolver, RequestMetadata,
    ResolveRequest,
};

const PUBLISH_SYSTEM_PROMPT: &str = "You are a senior Laravel solution architect and technical lead. \
You turn a requirements document into a complete, A-to-Z technical implementation guide that a \
development team can follow without asking further questions.\n\n\
Structure the guide as:\n\
1. Executive summary and scope\n\
2. Technology stack, with the alternatives considered and the reason for each choice\n\
3. System architecture and module boundaries\n\
4. Database design: every table, column, index and relationship, with migrations\n\
5. Domain models, services and API endpoints, with request and response examples\n\
6. Authentication, authorization and security hardening\n\
7. Background jobs, queues, caching and performance\n\
8. Testing strategy per feature\n\
9. Deployment, CI/CD and monitoring\n\
10. A phased implementation plan with milestones\n\n\
Provide real code rather than pseudocode, call out common pitfalls, and address scalability \
in every phase.";

const REPUBLISH_NOTE: &str =
    "**NOTE:** This is a REPUBLISH request. Review and improve the previous solution if possible.";

#[derive(Debug, Clone)]
pub struct PublishSolutionCommand {
    pub thread_id: String,
    /// Requirements document; when blank the saved requirements of the
    /// thread are used.
    pub requirements: Option<String>,
    pub user_id: Option<i64>,
    pub provider: Option<ProviderSettings>,
    pub is_republish: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishSolutionResult {
    pub solution: String,
    pub thread_id: String,
    pub model_used: String,
    pub is_republish: bool,
    pub word_count: usize,
    pub char_count: usize,
    pub generated_at: DateTime<Utc>,
}

pub struct PublishSolutionHandler {
    resolver: Arc<dyn ReasoningResolver>,
    sink: Arc<dyn ArtifactSink>,
    max_tokens: u32,
    temperature: f32,
}

impl PublishSolutionHandler {
    pub fn new(resolver: Arc<dyn ReasoningResolver>, sink: Arc<dyn ArtifactSink>, ai: &AiConfig) -> Self {
        Self {
            resolver,
            sink,
            max_tokens: ai.publish_max_tokens,
            temperature: ai.publish_temperature,
        }
    }

    pub async fn handle(&self, cmd: PublishSolutionCommand) -> Result<PublishSolutionResult, EngineError> {
        let thread_id = ConversationId::parse(cmd.thread_id)?;
        let user_id = cmd.user_id.map(UserId::new);
        let requirements = self.requirements_for(&thread_id, cmd.requirements).await?;

        let capability = self
            .resolver
            .resolve(&ResolveRequest::publishing(user_id, cmd.provider))
            .await?;

        tracing::info!(
            conversation_id = %thread_id,
            republish = cmd.is_republish,
            model = %capability.provider_info().model,
            requirements_chars = requirements.len(),
            "Generating technical solution"
        );

        let request = ReasoningRequest::new(
            RequestMetadata::new(thread_id.clone(), Uuid::new_v4().to_string()).with_user(user_id),
        )
        .with_system_prompt(PUBLISH_SYSTEM_PROMPT)
        .with_turn(Turn::human(task_message(&requirements, cmd.is_republish)))
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature);

        let response = capability.reason(request).await?;
        let solution = response.content;

        tracing::info!(
            conversation_id = %thread_id,
            chars = solution.len(),
            total_tokens = response.usage.total_tokens,
            "Technical solution generated"
        );

        Ok(PublishSolutionResult {
            word_count: solution.split_whitespace().count(),
            char_count: solution.chars().count(),
            solution,
            thread_id: thread_id.to_string(),
            model_used: response.model,
            is_republish: cmd.is_republish,
            generated_at: Utc::now(),
        })
    }

    async fn requirements_for(
        &self,
        thread_id: &ConversationId,
        supplied: Option<String>,
    ) -> Result<String, EngineError> {
        if let Some(text) = supplied.filter(|t| !t.trim().is_empty()) {
            return Ok(text);
        }
        let stored = self.sink.load_artifacts(thread_id).await?;
        stored
            .requirements
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                EngineError::invalid_input(format!(
                    "No requirements supplied and none saved for thread {}",
                    thread_id
                ))
            })
    }
}

fn task_message(requirements: &str, is_republish: bool) -> String {
    let note = if is_republish { REPUBLISH_NOTE } else { "" };
    format!(
        "# REQUIREMENTS DOCUMENT\n\n{}\n\n---\n\n## YOUR TASK:\n\n\
Create a COMPREHENSIVE, A-Z, step-by-step technical implementation guide following the \
structure provided in the system prompt.\n\n\
**Remember:**\n\
- Be extremely detailed and provide complete code examples\n\
- Justify every technical decision\n\
- Address security, performance and scalability\n\
- Include testing and deployment strategies\n\n\
{}\n\nBegin your comprehensive technical implementation guide now:",
        requirements, note
    )
}
