//! Prompt system for Coursewise.
//!
//! This crate provides:
//! - YAML-based prompt definitions under `.coursewise/prompts/`
//! - A built-in course assistant prompt
//! - Handlebars rendering with conversation history injection

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_course_prompt, build_prompt};
pub use loader::{list_prompts, load_course_assistant, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
