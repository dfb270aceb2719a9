//! `save_requirements` and `save_solution`.
//!
//! Both upsert one document per conversation through the artifact sink, so a
//! repeated call replaces rather than appends.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::tools::{Artifact, ArtifactKind, ToolDefinition, SAVE_REQUIREMENTS, SAVE_SOLUTION};
use crate::ports::{
    required_string, ArtifactSink, ToolContext, ToolExecutionError, ToolHandler, ToolOutput,
};

pub struct SaveArtifactTool {
    kind: ArtifactKind,
    sink: Arc<dyn ArtifactSink>,
}

impl SaveArtifactTool {
    pub fn requirements(sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            kind: ArtifactKind::Requirements,
            sink,
        }
    }

    pub fn solution(sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            kind: ArtifactKind::Solution,
            sink,
        }
    }

    fn argument(&self) -> &'static str {
        match self.kind {
            ArtifactKind::Requirements => "requirements",
            ArtifactKind::Solution => "solution",
        }
    }
}

#[async_trait]
impl ToolHandler for SaveArtifactTool {
    fn definition(&self) -> ToolDefinition {
        match self.kind {
            ArtifactKind::Requirements => ToolDefinition::single_string(
                SAVE_REQUIREMENTS,
                "Saves the gathered requirements to memory.",
                "requirements",
                "The complete requirements document gathered from the user",
            ),
            ArtifactKind::Solution => ToolDefinition::single_string(
                SAVE_SOLUTION,
                "Saves the proposed solution to memory.",
                "solution",
                "The complete proposed technical solution",
            ),
        }
    }

    async fn invoke(&self, arguments: &Value, context: &ToolContext) -> Result<ToolOutput, ToolExecutionError> {
        let content = required_string(arguments, self.argument())?;
        let artifact = Artifact {
            kind: self.kind,
            content: content.to_string(),
        };

        self.sink
            .upsert_artifact(&context.conversation_id, context.user_id, &artifact)
            .await
            .map_err(|e| ToolExecutionError::failed(e.to_string()))?;

        tracing::info!(
            conversation_id = %context.conversation_id,
            kind = %self.kind,
            chars = artifact.content.len(),
            "Artifact saved"
        );

        let message = match self.kind {
            ArtifactKind::Requirements => "Requirements saved successfully.",
            ArtifactKind::Solution => "Solution saved successfully.",
        };
        Ok(ToolOutput::message(message).with_artifact(artifact))
    }
}
