//! Ollama reasoning engine provider.
//!
//! Uses the chat endpoint with native tool calling.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{
    ChatMessage, ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmUsage, Role, StopReason,
    ToolDefinition,
};
use coursewise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434")
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Convert a ChatRequest to Ollama format.
    fn to_ollama_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system.clone(),
                tool_calls: Vec::new(),
            });
        }

        for message in &request.messages {
            messages.extend(convert_message(message));
        }

        OllamaChatRequest {
            model: request.model.clone(),
            messages,
            tools: request
                .tools
                .as_deref()
                .map(convert_tools)
                .unwrap_or_default(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }

    /// Convert an Ollama response to a ChatResponse.
    fn convert_response(&self, response: OllamaChatResponse) -> ChatResponse {
        let mut content = Vec::new();

        if !response.message.content.is_empty() {
            content.push(ContentBlock::text(response.message.content));
        }

        let has_tool_calls = !response.message.tool_calls.is_empty();

        // Ollama does not assign call ids, so generate stable per-response ones.
        for (i, call) in response.message.tool_calls.into_iter().enumerate() {
            content.push(ContentBlock::ToolUse {
                id: format!("call_{}", i),
                name: call.function.name,
                input: call.function.arguments,
            });
        }

        let stop_reason = if has_tool_calls {
            StopReason::ToolUse
        } else {
            match response.done_reason.as_deref() {
                Some("length") => StopReason::MaxTokens,
                _ => StopReason::EndTurn,
            }
        };

        ChatResponse {
            content,
            stop_reason,
            model: response.model,
            usage: LlmUsage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
        }
    }
}

/// One chat message may expand to several Ollama messages (one per tool result).
fn convert_message(message: &ChatMessage) -> Vec<OllamaMessage> {
    let role = match message.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    let mut out = Vec::new();
    let mut text = Vec::new();
    let mut tool_calls = Vec::new();

    for block in &message.content {
        match block {
            ContentBlock::Text { text: t } => text.push(t.as_str()),
            ContentBlock::ToolUse { name, input, .. } => tool_calls.push(OllamaToolCall {
                function: OllamaFunctionCall {
                    name: name.clone(),
                    arguments: input.clone(),
                },
            }),
            ContentBlock::ToolResult {
                content, is_error, ..
            } => out.push(OllamaMessage {
                role: "tool".to_string(),
                content: if *is_error {
                    format!("Error: {}", content)
                } else {
                    content.clone()
                },
                tool_calls: Vec::new(),
            }),
        }
    }

    if !text.is_empty() || !tool_calls.is_empty() {
        out.insert(
            0,
            OllamaMessage {
                role: role.to_string(),
                content: text.join("\n"),
                tool_calls,
            },
        );
    }

    out
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OllamaTool> {
    tools
        .iter()
        .map(|tool| OllamaTool {
            kind: "function",
            function: OllamaFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    #[tracing::instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::debug!(
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "Sending chat request to Ollama"
        );

        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::debug!(
            tool_calls = ollama_response.message.tool_calls.len(),
            "Received chat response from Ollama"
        );

        Ok(self.convert_response(ollama_response))
    }
}
