//! Tool definition - schema and metadata for a tool an agent may call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of a tool that can be offered to a reasoning provider.
///
/// The parameters schema is plain JSON Schema; each provider adapter wraps it
/// in its own envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    name: String,
    description: String,
    parameters_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
        }
    }

    /// Schema for a tool taking a single required string argument.
    pub fn single_string(
        name: impl Into<String>,
        description: impl Into<String>,
        argument: &str,
        argument_description: &str,
    ) -> Self {
        let mut properties = serde_json::Map::new();
        properties.insert(
            argument.to_string(),
            serde_json::json!({ "type": "string", "description": argument_description }),
        );
        Self::new(
            name,
            description,
            serde_json::json!({
                "type": "object",
                "required": [argument],
                "properties": properties
            }),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters_schema(&self) -> &Value {
        &self.parameters_schema
    }

    /// Converts to OpenAI function-tool format.
    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema
            }
        })
    }

    /// Converts to Anthropic tool format.
    pub fn to_anthropic_format(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.parameters_schema
        })
    }
}
