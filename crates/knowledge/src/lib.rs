//! Course knowledge base and tool-augmented answering.
//!
//! Course documents are parsed into a catalog entry per course and a set of
//! lesson chunks, both stored in a [`SemanticIndex`]. Questions go through
//! [`RagSystem::answer`], which lets the reasoning engine search the index
//! once before it answers.
//!
//! # Example
//! ```no_run
//! use coursewise_core::AppConfig;
//! use coursewise_knowledge::RagSystem;
//!
//! # async fn example() -> coursewise_core::AppResult<()> {
//! let config = AppConfig::load()?;
//! let system = RagSystem::from_config(&config).await?;
//! system.clear_and_reload(&config.docs_dir(), false).await?;
//!
//! let result = system.answer("What does lesson 1 of the MCP course cover?", None).await?;
//! println!("{}", result.answer);
//! # Ok(())
//! # }
//! ```

pub mod embeddings;
pub mod filter;
pub mod index;
pub mod loader;
pub mod rag;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use filter::{build_filter, ContentFilter};
pub use index::{open_index, squared_distance, LanceDbIndex, MemoryIndex, SemanticIndex};
pub use loader::{discover_documents, parse_document, DocumentLoader};
pub use rag::{AnswerResult, RagSystem, SearchMiss};
pub use resolver::CourseResolver;
pub use types::{
    ChunkMatch, ContentChunk, CourseAnalytics, CourseMatch, CourseMetadata, LessonRef, LoadStats,
    SourceCitation,
};
