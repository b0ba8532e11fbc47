//! Reasoning engine integration for Coursewise.
//!
//! A provider-agnostic chat abstraction with native tool calling. The
//! engine is treated as opaque: prompt, history and tool definitions go in,
//! text or tool-call requests come out.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Claude**: Anthropic Messages API
//!
//! # Example
//! ```no_run
//! use coursewise_llm::{ChatMessage, ChatRequest, LlmClient, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new("llama3.2", vec![ChatMessage::user("Hello, world!")]);
//! let response = client.chat(&request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    ChatMessage, ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmUsage, Role, StopReason,
    ToolCall, ToolDefinition,
};
pub use factory::{create_client, create_client_from_config};
pub use providers::{ClaudeClient, OllamaClient};
pub use types::ProviderType;
