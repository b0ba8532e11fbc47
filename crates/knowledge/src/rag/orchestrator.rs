//! Two-pass tool-calling loop against the reasoning engine.
//!
//! The first call offers the tools. If the engine asks for any, they are
//! dispatched in request order and their results sent back in a second call
//! that offers no tools. Whatever that call returns is the answer.

use super::tools::ToolRegistry;
use super::types::AnswerResult;
use coursewise_core::AppResult;
use coursewise_llm::{ChatMessage, ChatRequest, ContentBlock, LlmClient, Role, ToolCall};
use std::sync::Arc;

/// Rounds of tool use allowed per query.
pub const MAX_TOOL_ROUNDS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingFirstResponse,
    AwaitingFinalResponse,
}

/// Sampling settings and the engine used for every request.
pub struct Orchestrator {
    client: Arc<dyn LlmClient>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: 800,
            temperature: 0.0,
        }
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Answer `user` under `system`, letting the engine use `tools`.
    ///
    /// Tool failures are reported back to the engine as error results.
    /// Engine failures propagate.
    pub async fn run(&self, system: &str, user: &str, tools: &ToolRegistry) -> AppResult<AnswerResult> {
        let mut dispatcher = tools.dispatcher();
        let mut messages = vec![ChatMessage::user(user)];
        let mut phase = Phase::AwaitingFirstResponse;
        let mut rounds = 0;

        loop {
            let mut request = ChatRequest::new(&self.model, messages.clone())
                .with_system(system)
                .with_max_tokens(self.max_tokens)
                .with_temperature(self.temperature);
            if phase == Phase::AwaitingFirstResponse && !tools.is_empty() {
                request = request.with_tools(tools.definitions());
            }

            tracing::debug!(
                "Engine call ({:?}, {} messages, tools offered: {})",
                phase,
                request.messages.len(),
                request.tools.is_some()
            );
            let response = self.client.chat(&request).await?;

            if phase == Phase::AwaitingFinalResponse || !response.wants_tools() {
                return Ok(AnswerResult::new(response.text(), dispatcher.into_sources()));
            }

            let calls = response.tool_calls();

            tracing::info!(
                "Engine requested {} tool call(s): {}",
                calls.len(),
                calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
            );

            let mut results = Vec::with_capacity(calls.len());
            for ToolCall { id, name, input } in calls {
                match dispatcher.execute(&name, &input).await {
                    Ok(output) => results.push(ContentBlock::tool_result(id, output)),
                    Err(e) => {
                        tracing::warn!("Tool '{}' failed: {}", name, e);
                        results.push(ContentBlock::tool_error(id, e.to_string()));
                    }
                }
            }

            messages.push(ChatMessage::with_blocks(Role::Assistant, response.content));
            messages.push(ChatMessage::with_blocks(Role::User, results));

            rounds += 1;
            if rounds >= MAX_TOOL_ROUNDS {
                phase = Phase::AwaitingFinalResponse;
            }
        }
    }
}
