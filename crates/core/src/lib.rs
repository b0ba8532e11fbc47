//! Coursewise Core Library
//!
//! This crate provides the foundational utilities shared by every Coursewise crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (`AppConfig`, `RagConfig`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, EmbeddingSettings, IndexBackend, RagConfig};
pub use error::{AppError, AppResult};
