//! `search_knowledge_base` - retrieval over the Laravel documentation index.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::tools::{ToolDefinition, SEARCH_KNOWLEDGE_BASE};
use crate::ports::{
    required_string, KnowledgeBase, ToolContext, ToolExecutionError, ToolHandler, ToolOutput,
};

pub struct SearchKnowledgeBaseTool {
    knowledge_base: Arc<dyn KnowledgeBase>,
    top_k: usize,
}

impl SearchKnowledgeBaseTool {
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>, top_k: usize) -> Self {
        Self {
            knowledge_base,
            top_k,
        }
    }
}

#[async_trait]
impl ToolHandler for SearchKnowledgeBaseTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::single_string(
            SEARCH_KNOWLEDGE_BASE,
            "Searches the knowledge base for relevant information about Laravel development, \
             packages, and best practices.",
            "query",
            "What to look up",
        )
    }

    async fn invoke(&self, arguments: &Value, context: &ToolContext) -> Result<ToolOutput, ToolExecutionError> {
        let query = required_string(arguments, "query")?;

        let snippets = self
            .knowledge_base
            .search(query, self.top_k)
            .await
            .map_err(|e| ToolExecutionError::failed(format!("Error searching knowledge base: {}", e)))?;

        tracing::debug!(
            conversation_id = %context.conversation_id,
            hits = snippets.len(),
            "Knowledge base searched"
        );

        if snippets.is_empty() {
            return Ok(ToolOutput::message(
                "No relevant information found in the knowledge base.",
            ));
        }
        let joined = snippets
            .into_iter()
            .map(|s| s.content)
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(ToolOutput::message(joined))
    }
}
