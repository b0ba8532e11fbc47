//! Reasoning engine abstraction and chat/tool-call types.
//!
//! The engine is stateless: every request carries the full message list,
//! the system prompt and (optionally) the tool definitions it may call.

use coursewise_core::AppResult;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text
    Text { text: String },

    /// The engine asks for a tool to be run
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Output of a tool run, answering the `ToolUse` with the same id
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl ContentBlock {
    /// Create a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a successful tool result block.
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error-flagged tool result block.
    pub fn tool_error(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: message.into(),
            is_error: true,
        }
    }
}

/// A single message in the conversation sent to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    /// A user message holding plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// A message with arbitrary content blocks.
    pub fn with_blocks(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }
}

/// Tool description advertised to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool arguments
    pub input_schema: serde_json::Value,
}

/// A tool invocation requested by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "llama3.2", "claude-sonnet-4-20250514")
    pub model: String,

    /// System prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,

    /// Tools the engine may call; `None` forbids tool use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for sampling
    pub temperature: f32,
}

impl ChatRequest {
    /// Create a request with default sampling settings.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages,
            tools: None,
            max_tokens: 800,
            temperature: 0.0,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Offer tools to the engine.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Why the engine stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Content blocks in generation order
    pub content: Vec<ContentBlock>,

    /// Why generation stopped
    pub stop_reason: StopReason,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    #[serde(default)]
    pub usage: LlmUsage,
}

impl ChatResponse {
    /// A text-only response, mostly useful for tests and simple providers.
    pub fn from_text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            stop_reason: StopReason::EndTurn,
            model: model.into(),
            usage: LlmUsage::default(),
        }
    }

    /// Tool calls requested in this response, in request order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Whether the engine asked for at least one tool.
    pub fn wants_tools(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }

    /// First text block, or the empty string.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for reasoning engine providers.
///
/// Implementations translate `ChatRequest` into their wire format and map
/// every transport or protocol failure to `AppError::Llm`.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "claude").
    fn provider_name(&self) -> &str;

    /// Perform one chat completion.
    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_block_wire_shape() {
        let block = ContentBlock::ToolUse {
            id: "toolu_1".to_string(),
            name: "search_course_content".to_string(),
            input: json!({"query": "widgets"}),
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["input"]["query"], "widgets");

        let ok = serde_json::to_value(ContentBlock::tool_result("toolu_1", "found")).unwrap();
        assert_eq!(ok["type"], "tool_result");
        assert!(ok.get("is_error").is_none());

        let err = serde_json::to_value(ContentBlock::tool_error("toolu_1", "boom")).unwrap();
        assert_eq!(err["is_error"], true);
    }

    #[test]
    fn test_response_helpers() {
        let response = ChatResponse {
            content: vec![
                ContentBlock::text("Let me look that up."),
                ContentBlock::ToolUse {
                    id: "a".to_string(),
                    name: "first".to_string(),
                    input: json!({}),
                },
                ContentBlock::ToolUse {
                    id: "b".to_string(),
                    name: "second".to_string(),
                    input: json!({}),
                },
            ],
            stop_reason: StopReason::ToolUse,
            model: "test".to_string(),
            usage: LlmUsage::default(),
        };

        assert!(response.wants_tools());
        let names: Vec<_> = response.tool_calls().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(response.text(), "Let me look that up.");
    }

    #[test]
    fn test_text_defaults_to_empty() {
        let response = ChatResponse {
            content: vec![],
            stop_reason: StopReason::EndTurn,
            model: "test".to_string(),
            usage: LlmUsage::default(),
        };
        assert_eq!(response.text(), "");
        assert!(!response.wants_tools());
    }

    #[test]
    fn test_unknown_stop_reason_parses() {
        let reason: StopReason = serde_json::from_str("\"pause_turn\"").unwrap();
        assert_eq!(reason, StopReason::Other);
    }

    #[test]
    fn test_usage_total() {
        let usage = LlmUsage::new(10, 5);
        assert_eq!(usage.total_tokens, 15);
    }
}
