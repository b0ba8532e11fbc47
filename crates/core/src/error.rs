//! Error types for Coursewise.
//!
//! One enum covers every failure category in the workspace. Retrieval misses
//! (unknown course, empty result) are not errors: they are rendered into
//! user-facing text by the search tools and never reach this type.

use thiserror::Error;

/// Unified error type for Coursewise.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reasoning engine unavailable or returned an unusable response
    #[error("LLM error: {0}")]
    Llm(String),

    /// Semantic index unavailable or corrupt
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding model failures
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Course document loading and ingestion errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// The reasoning engine asked for a tool that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A tool was invoked with missing or malformed arguments
    #[error("Invalid tool arguments: {0}")]
    InvalidToolArguments(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error comes from an unavailable collaborator
    /// (reasoning engine, index or embedding model).
    pub fn is_collaborator_outage(&self) -> bool {
        matches!(self, Self::Llm(_) | Self::Index(_) | Self::Embedding(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_outage_classification() {
        assert!(AppError::Llm("down".into()).is_collaborator_outage());
        assert!(AppError::Index("down".into()).is_collaborator_outage());
        assert!(!AppError::UnknownTool("x".into()).is_collaborator_outage());
        assert!(!AppError::Config("bad".into()).is_collaborator_outage());
    }

    #[test]
    fn test_unknown_tool_message() {
        let err = AppError::UnknownTool("fly_to_moon".to_string());
        assert_eq!(err.to_string(), "Unknown tool: fly_to_moon");
    }

    #[test]
    fn test_serde_json_conversion() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
