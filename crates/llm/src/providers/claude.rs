//! Anthropic Messages API provider.
//!
//! API reference: https://docs.anthropic.com/en/api/messages

use crate::client::{
    ChatMessage, ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmUsage, StopReason,
    ToolDefinition,
};
use coursewise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
const DEFAULT_API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<StopReason>,
    #[serde(default)]
    usage: Option<ClaudeUsage>,
}

/// Response blocks; anything we do not act on is skipped.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Claude client for the Messages API.
pub struct ClaudeClient {
    base_url: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl ClaudeClient {
    /// Create a client against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom endpoint (proxies, gateways).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client,
        }
    }

    /// Override the `anthropic-version` header.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    fn to_messages_request<'a>(&self, request: &'a ChatRequest) -> MessagesRequest<'a> {
        let tools = request.tools.as_deref().filter(|t| !t.is_empty());

        MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: &request.messages,
            tools,
            tool_choice: tools.map(|_| ToolChoice { kind: "auto" }),
        }
    }

    fn convert_response(&self, response: MessagesResponse) -> ChatResponse {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
                ResponseBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                ResponseBlock::Unsupported => None,
            })
            .collect();

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        ChatResponse {
            content,
            stop_reason: response.stop_reason.unwrap_or(StopReason::EndTurn),
            model: response.model,
            usage,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ClaudeClient {
    fn provider_name(&self) -> &str {
        "claude"
    }

    #[tracing::instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let body = self.to_messages_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(
            tools = body.tools.map_or(0, <[_]>::len),
            "Sending chat request to Claude"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Claude: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|b| format!("{}: {}", b.error.kind, b.error.message))
                .unwrap_or(error_text);
            return Err(AppError::Llm(format!(
                "Claude API error ({}): {}",
                status, detail
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Claude response: {}", e)))?;

        let converted = self.convert_response(parsed);
        tracing::debug!(
            stop_reason = ?converted.stop_reason,
            tokens = converted.usage.total_tokens,
            "Received chat response from Claude"
        );

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search course materials".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
        }
    }

    #[test]
    fn test_request_body_with_tools() {
        let client = ClaudeClient::new("test-key");
        let request = ChatRequest::new("claude-sonnet-4-20250514", vec![ChatMessage::user("hi")])
            .with_system("system text")
            .with_tools(vec![search_tool()]);

        let body = serde_json::to_value(client.to_messages_request(&request)).unwrap();
        assert_eq!(body["system"], "system text");
        assert_eq!(body["tool_choice"]["type"], "auto");
        assert_eq!(body["tools"][0]["name"], "search_course_content");
        assert_eq!(body["messages"][0]["content"][0]["type"], "text");
        assert_eq!(body["max_tokens"], 800);
    }

    #[test]
    fn test_request_body_without_tools() {
        let client = ClaudeClient::new("test-key");
        let request = ChatRequest::new("m", vec![ChatMessage::user("hi")]);

        let body = serde_json::to_value(client.to_messages_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_response_parsing_skips_unknown_blocks() {
        let client = ClaudeClient::new("test-key");
        let raw: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "x"},
                {"type": "text", "text": "Searching."},
                {"type": "tool_use", "id": "toolu_1", "name": "search_course_content",
                 "input": {"query": "widgets"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 20, "output_tokens": 7}
        }))
        .unwrap();

        let response = client.convert_response(raw);
        assert_eq!(response.content.len(), 2);
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.tool_calls()[0].id, "toolu_1");
        assert_eq!(response.usage.total_tokens, 27);
    }
}
