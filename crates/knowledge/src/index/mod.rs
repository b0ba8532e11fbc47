//! Semantic index over two collections: the course catalog and lesson content.
//!
//! Both collections are searched by embedding distance. The catalog holds one
//! entry per course (keyed by title, embedded by title); the content
//! collection holds lesson chunks, optionally narrowed by a [`ContentFilter`].

pub mod lance;
pub mod memory;

pub use lance::LanceDbIndex;
pub use memory::MemoryIndex;

use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::filter::ContentFilter;
use crate::types::{ChunkMatch, ContentChunk, CourseMatch, CourseMetadata};
use coursewise_core::{AppConfig, AppResult, IndexBackend};
use std::sync::Arc;

/// Dual-collection semantic store.
///
/// Results are ranked by ascending distance. An empty collection yields an
/// empty result, never an error.
#[async_trait::async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Insert a course, replacing any existing entry with the same title.
    async fn upsert_course(&self, course: &CourseMetadata) -> AppResult<()>;

    /// Insert chunks, replacing existing ones with the same (title, chunk_index).
    async fn upsert_chunks(&self, chunks: &[ContentChunk]) -> AppResult<()>;

    /// Nearest courses to `text` by title embedding.
    async fn query_catalog(&self, text: &str, top_k: usize) -> AppResult<Vec<CourseMatch>>;

    /// Nearest chunks to `text` among those matching `filter`.
    async fn query_content(
        &self,
        text: &str,
        filter: &ContentFilter,
        top_k: usize,
    ) -> AppResult<Vec<ChunkMatch>>;

    /// Remove everything from both collections.
    async fn clear_all(&self) -> AppResult<()>;

    /// All catalog titles, sorted.
    async fn course_titles(&self) -> AppResult<Vec<String>>;

    /// Full catalog entry for an exact title.
    async fn get_course(&self, title: &str) -> AppResult<Option<CourseMetadata>>;

    async fn course_count(&self) -> AppResult<usize> {
        Ok(self.course_titles().await?.len())
    }

    /// Link of one lesson of an exact course title.
    async fn lesson_link(&self, title: &str, lesson_number: u32) -> AppResult<Option<String>> {
        Ok(self
            .get_course(title)
            .await?
            .and_then(|c| c.lesson_link(lesson_number).map(str::to_string)))
    }
}

/// Squared Euclidean distance. For unit vectors this equals `2 * (1 - cos)`,
/// so it ranges over `[0, 4]`.
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Open the index backend selected in configuration, with its embedding model.
pub async fn open_index(config: &AppConfig) -> AppResult<Arc<dyn SemanticIndex>> {
    let embedder: Arc<dyn EmbeddingProvider> = create_provider(&config.rag.embedding).await?;

    match config.rag.index_backend {
        IndexBackend::Memory => {
            tracing::debug!("Using in-memory index");
            Ok(Arc::new(MemoryIndex::new(embedder)))
        }
        IndexBackend::LanceDb => {
            let index = LanceDbIndex::open(&config.index_path(), embedder).await?;
            Ok(Arc::new(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_distance_unit_vectors() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = [-1.0, 0.0];

        assert_eq!(squared_distance(&a, &a), 0.0);
        assert!((squared_distance(&a, &b) - 2.0).abs() < 1e-6);
        assert!((squared_distance(&a, &c) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_sits_at_one() {
        let unit = [0.6, 0.8];
        let zero = [0.0, 0.0];
        assert!((squared_distance(&unit, &zero) - 1.0).abs() < 1e-6);
    }
}
