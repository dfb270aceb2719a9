//! Tool Dispatcher - runs requested tools by wire name.
//!
//! The registry is built once at startup. Nothing a tool does can abort the
//! turn: unknown names, bad arguments and tool failures all come back as
//! error results the agent sees on its next step. There are no retries here.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::domain::agents::AgentProfile;
use crate::domain::conversation::{ToolRequest, ToolResult};
use crate::domain::tools::{Artifact, ToolDefinition};
use crate::ports::{ToolContext, ToolHandler};

/// Result of one dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub result: ToolResult,
    pub artifact: Option<Artifact>,
}

impl DispatchOutcome {
    fn failed(request: &ToolRequest, message: impl Into<String>) -> Self {
        Self {
            result: ToolResult::error(request, message),
            artifact: None,
        }
    }
}

#[derive(Default)]
pub struct ToolDispatcher {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolDispatcher {
    pub fn new(handlers: Vec<Arc<dyn ToolHandler>>) -> Self {
        let mut registry = HashMap::with_capacity(handlers.len());
        for handler in handlers {
            let name = handler.definition().name().to_string();
            if registry.insert(name.clone(), handler).is_some() {
                tracing::warn!(tool = %name, "Tool registered twice, keeping the last handler");
            }
        }
        Self { handlers: registry }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Definitions of the tools `profile` offers, in profile order.
    pub fn definitions_for(&self, profile: &AgentProfile) -> Vec<ToolDefinition> {
        profile
            .tools
            .iter()
            .filter_map(|name| match self.handlers.get(name) {
                Some(handler) => Some(handler.definition()),
                None => {
                    tracing::warn!(tool = %name, agent = %profile.id, "Agent offers an unregistered tool");
                    None
                }
            })
            .collect()
    }

    /// Runs one request.
    pub async fn dispatch(&self, request: &ToolRequest, context: &ToolContext) -> DispatchOutcome {
        let Some(handler) = self.handlers.get(&request.name) else {
            tracing::warn!(tool = %request.name, call_id = %request.id, "Unknown tool requested");
            return DispatchOutcome::failed(request, format!("Unknown tool: {}", request.name));
        };

        match handler.invoke(&request.arguments, context).await {
            Ok(output) => {
                tracing::debug!(tool = %request.name, call_id = %request.id, "Tool completed");
                DispatchOutcome {
                    result: ToolResult::success(request, output.payload),
                    artifact: output.artifact,
                }
            }
            Err(e) => {
                tracing::warn!(tool = %request.name, call_id = %request.id, error = %e, "Tool failed");
                DispatchOutcome::failed(request, e.to_string())
            }
        }
    }

    /// Runs every request of one agent reply concurrently.
    ///
    /// Outcomes come back in request order. Tools the agent was not offered
    /// are refused without running.
    pub async fn dispatch_all(
        &self,
        profile: &AgentProfile,
        requests: &[ToolRequest],
        context: &ToolContext,
    ) -> Vec<DispatchOutcome> {
        join_all(requests.iter().map(|request| async move {
            if !profile.offers(&request.name) && self.contains(&request.name) {
                tracing::warn!(tool = %request.name, agent = %profile.id, "Tool not offered to agent");
                return DispatchOutcome::failed(
                    request,
                    format!("Tool '{}' is not available to agent '{}'", request.name, profile.id),
                );
            }
            self.dispatch(request, context).await
        }))
        .await
    }
}
