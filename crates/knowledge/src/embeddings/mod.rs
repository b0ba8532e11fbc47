//! Embedding models: text in, fixed-length vector out.
//!
//! Vectors are expected to be L2-normalized; the semantic index measures
//! squared Euclidean distance between them.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{ollama::OllamaProvider, trigram::TrigramProvider};
