//! Reasoning engine provider implementations.

pub mod claude;
pub mod ollama;

pub use claude::ClaudeClient;
pub use ollama::OllamaClient;
