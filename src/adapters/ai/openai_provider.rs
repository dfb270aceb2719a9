//! OpenAI Provider - ReasoningCapability over the chat completions API.
//!
//! Agent tools are offered as function tools; tool requests and results in
//! the history map onto assistant `tool_calls` and `tool` role messages.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::domain::conversation::Turn;
use crate::ports::{
    AIError, FinishReason, ProposedToolCall, ProviderInfo, ReasoningCapability, ReasoningRequest,
    ReasoningResponse, TokenUsage,
};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_secret(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            ..Self::new(String::new())
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &ReasoningRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage::text("system", prompt));
        }

        for turn in &request.history {
            messages.push(match turn {
                Turn::Human(human) => OpenAIMessage::text("user", &human.content),
                Turn::AgentReply(reply) => OpenAIMessage {
                    role: "assistant".to_string(),
                    content: if reply.content.is_empty() && reply.has_tool_requests() {
                        None
                    } else {
                        Some(reply.content.clone())
                    },
                    tool_calls: reply
                        .tool_requests
                        .iter()
                        .map(|req| OpenAIToolCall {
                            id: req.id.to_string(),
                            kind: "function".to_string(),
                            function: OpenAIFunctionCall {
                                name: req.name.clone(),
                                arguments: req.arguments.to_string(),
                            },
                        })
                        .collect(),
                    tool_call_id: None,
                },
                Turn::ToolResult(result) => OpenAIMessage {
                    role: "tool".to_string(),
                    content: Some(result.payload_text()),
                    tool_calls: Vec::new(),
                    tool_call_id: Some(result.request_id.to_string()),
                },
            });
        }

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            tools: request.tools.iter().map(|t| t.to_openai_format()).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &ReasoningRequest) -> Result<Response, AIError> {
        let openai_request = self.to_openai_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses onto the error taxonomy.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 => {
                if error_body.contains("context_length_exceeded")
                    || error_body.contains("maximum context length")
                {
                    Err(AIError::ContextTooLong(error_body))
                } else {
                    Err(AIError::InvalidRequest(error_body))
                }
            }
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses "try again in Ns" from an error body, defaulting to 30s.
    fn parse_retry_after(error_body: &str) -> u32 {
        serde_json::from_str::<Value>(error_body)
            .ok()
            .and_then(|parsed| {
                let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
                let idx = message.find("try again in ")?;
                let digits: String = message[idx + 13..]
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse::<u32>().ok()
            })
            .unwrap_or(30)
    }

    fn parse_completion(openai_response: OpenAIResponse) -> Result<ReasoningResponse, AIError> {
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some("tool_calls") | Some("function_call") => FinishReason::ToolUse,
            _ => FinishReason::Stop,
        };

        let tool_calls: Vec<ProposedToolCall> = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                // Malformed argument JSON reaches the tool as a bare string and
                // fails its validation there.
                let arguments = serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments));
                ProposedToolCall::new(Some(call.id), call.function.name, arguments)
            })
            .collect();

        let content = choice.message.content.unwrap_or_default();
        if finish_reason == FinishReason::ContentFilter && content.is_empty() && tool_calls.is_empty() {
            return Err(AIError::content_filtered("reply withheld by the provider's content filter"));
        }

        let usage = openai_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(ReasoningResponse {
            content,
            tool_calls,
            model: openai_response.model,
            usage,
            finish_reason,
        })
    }
}

#[async_trait]
impl ReasoningCapability for OpenAIProvider {
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, AIError> {
        let response = self.send_request(&request).await?;
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Self::parse_completion(openai_response)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", &self.config.model)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAIToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAIFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{AgentReply, ToolRequest, ToolResult};
    use crate::domain::foundation::{AgentId, ConversationId, ToolCallId};
    use crate::domain::tools::ToolDefinition;
    use crate::ports::RequestMetadata;
    use serde_json::json;

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new(OpenAIConfig::new("test-key")).unwrap()
    }

    fn request_with_tool_exchange() -> ReasoningRequest {
        let agent = AgentId::new("developer").unwrap();
        let req = ToolRequest::new(
            ToolCallId::new("call_1"),
            "search_knowledge_base",
            json!({"query": "queues"}),
        );
        ReasoningRequest::new(RequestMetadata::new(ConversationId::generate(), "t"))
            .with_system_prompt("You are a developer")
            .with_history(vec![
                Turn::human("How do queues work?"),
                AgentReply::with_tools(agent, "", vec![req.clone()]).into(),
                ToolResult::success(&req, json!("Use Horizon.")).into(),
            ])
            .with_tools(vec![ToolDefinition::single_string(
                "search_knowledge_base",
                "Search",
                "query",
                "Search query",
            )])
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o-mini")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn history_maps_to_tool_calling_messages() {
        let wire = serde_json::to_value(provider().to_openai_request(&request_with_tool_exchange()))
            .unwrap();
        let messages = wire["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert!(messages[2]["content"].is_null());
        assert_eq!(messages[2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(messages[2]["tool_calls"][0]["type"], "function");
        assert_eq!(
            messages[2]["tool_calls"][0]["function"]["arguments"],
            "{\"query\":\"queues\"}"
        );
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        assert_eq!(messages[3]["content"], "Use Horizon.");
        assert_eq!(wire["tools"][0]["function"]["name"], "search_knowledge_base");
    }

    #[test]
    fn parses_tool_calls_from_response() {
        let body = json!({
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "save_solution", "arguments": "{\"solution\":\"Plan\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        });
        let parsed: OpenAIResponse = serde_json::from_value(body).unwrap();
        let response = OpenAIProvider::parse_completion(parsed).unwrap();

        assert_eq!(response.content, "");
        assert_eq!(response.finish_reason, FinishReason::ToolUse);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id.as_deref(), Some("call_abc"));
        assert_eq!(response.tool_calls[0].arguments, json!({"solution": "Plan"}));
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn malformed_arguments_survive_as_string() {
        let body = json!({
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "save_solution", "arguments": "{not json"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let parsed: OpenAIResponse = serde_json::from_value(body).unwrap();
        let response = OpenAIProvider::parse_completion(parsed).unwrap();
        assert_eq!(response.tool_calls[0].arguments, json!("{not json"));
    }

    #[test]
    fn filtered_empty_reply_is_content_filtered() {
        let body = json!({
            "model": "gpt-4o",
            "choices": [{
                "message": {"role": "assistant", "content": null},
                "finish_reason": "content_filter"
            }]
        });
        let parsed: OpenAIResponse = serde_json::from_value(body).unwrap();
        assert!(matches!(
            OpenAIProvider::parse_completion(parsed),
            Err(AIError::ContentFiltered { .. })
        ));
    }

    #[test]
    fn empty_choices_is_parse_error() {
        let parsed: OpenAIResponse =
            serde_json::from_value(json!({"model": "gpt-4o", "choices": []})).unwrap();
        assert!(matches!(
            OpenAIProvider::parse_completion(parsed),
            Err(AIError::Parse(_))
        ));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 12 seconds."}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 12);
        assert_eq!(OpenAIProvider::parse_retry_after("not json"), 30);
    }

    #[test]
    fn provider_info_reports_model() {
        let info = provider().provider_info();
        assert_eq!(info.name, "openai");
        assert_eq!(info.model, "gpt-4o");
    }
}
