//! Process-local semantic index with brute-force scoring.

use super::{squared_distance, SemanticIndex};
use crate::embeddings::EmbeddingProvider;
use crate::filter::ContentFilter;
use crate::types::{ChunkMatch, ContentChunk, CourseMatch, CourseMetadata};
use coursewise_core::{AppError, AppResult};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Collections {
    catalog: BTreeMap<String, (CourseMetadata, Vec<f32>)>,
    content: Vec<(ContentChunk, Vec<f32>)>,
}

/// In-memory index. Embeddings are computed before the lock is taken, so
/// lock sections never await.
pub struct MemoryIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    collections: RwLock<Collections>,
}

impl MemoryIndex {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            collections: RwLock::new(Collections::default()),
        }
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| AppError::Index("Memory index lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| AppError::Index("Memory index lock poisoned".to_string()))
    }

    /// Number of stored chunks.
    pub fn chunk_count(&self) -> AppResult<usize> {
        Ok(self.read()?.content.len())
    }
}

#[async_trait::async_trait]
impl SemanticIndex for MemoryIndex {
    async fn upsert_course(&self, course: &CourseMetadata) -> AppResult<()> {
        let embedding = self.embedder.embed(&course.title).await?;
        self.write()?
            .catalog
            .insert(course.title.clone(), (course.clone(), embedding));
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[ContentChunk]) -> AppResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let mut guard = self.write()?;
        guard.content.retain(|(existing, _)| {
            !chunks.iter().any(|c| {
                c.course_title == existing.course_title && c.chunk_index == existing.chunk_index
            })
        });
        guard
            .content
            .extend(chunks.iter().cloned().zip(embeddings));

        Ok(())
    }

    async fn query_catalog(&self, text: &str, top_k: usize) -> AppResult<Vec<CourseMatch>> {
        let query = self.embedder.embed(text).await?;

        let mut matches: Vec<CourseMatch> = self
            .read()?
            .catalog
            .iter()
            .map(|(title, (_, embedding))| CourseMatch {
                title: title.clone(),
                distance: squared_distance(&query, embedding),
            })
            .collect();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn query_content(
        &self,
        text: &str,
        filter: &ContentFilter,
        top_k: usize,
    ) -> AppResult<Vec<ChunkMatch>> {
        let query = self.embedder.embed(text).await?;

        let mut matches: Vec<ChunkMatch> = self
            .read()?
            .content
            .iter()
            .filter(|(chunk, _)| filter.matches(chunk))
            .map(|(chunk, embedding)| ChunkMatch {
                chunk: chunk.clone(),
                distance: squared_distance(&query, embedding),
            })
            .collect();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn clear_all(&self) -> AppResult<()> {
        *self.write()? = Collections::default();
        Ok(())
    }

    async fn course_titles(&self) -> AppResult<Vec<String>> {
        Ok(self.read()?.catalog.keys().cloned().collect())
    }

    async fn get_course(&self, title: &str) -> AppResult<Option<CourseMetadata>> {
        Ok(self.read()?.catalog.get(title).map(|(c, _)| c.clone()))
    }

    async fn course_count(&self) -> AppResult<usize> {
        Ok(self.read()?.catalog.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TrigramProvider;
    use crate::filter::build_filter;
    use crate::types::LessonRef;

    fn index() -> MemoryIndex {
        MemoryIndex::new(Arc::new(TrigramProvider::new(384)))
    }

    fn chunk(title: &str, lesson: Option<u32>, idx: u32, text: &str) -> ContentChunk {
        ContentChunk {
            course_title: title.to_string(),
            lesson_number: lesson,
            chunk_index: idx,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let index = index();
        assert!(index.query_catalog("anything", 1).await.unwrap().is_empty());
        assert!(index
            .query_content("anything", &ContentFilter::unrestricted(), 5)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(index.course_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exact_title_at_distance_zero() {
        let index = index();
        index
            .upsert_course(&CourseMetadata::new("Intro to Widgets"))
            .await
            .unwrap();
        index
            .upsert_course(&CourseMetadata::new("Advanced Gadgets"))
            .await
            .unwrap();

        let matches = index.query_catalog("Intro to Widgets", 2).await.unwrap();
        assert_eq!(matches[0].title, "Intro to Widgets");
        assert!(matches[0].distance.abs() < 1e-6);
        assert!(matches[1].distance > matches[0].distance);
    }

    #[tokio::test]
    async fn test_reingest_replaces_course() {
        let index = index();
        let mut course = CourseMetadata::new("Intro to Widgets");
        index.upsert_course(&course).await.unwrap();

        course.instructor = Some("Ada".to_string());
        course.lessons.push(LessonRef {
            number: 1,
            title: "Basics".to_string(),
            link: Some("https://example.com/w/1".to_string()),
        });
        index.upsert_course(&course).await.unwrap();

        assert_eq!(index.course_count().await.unwrap(), 1);
        let stored = index.get_course("Intro to Widgets").await.unwrap().unwrap();
        assert_eq!(stored.instructor.as_deref(), Some("Ada"));
        assert_eq!(
            index.lesson_link("Intro to Widgets", 1).await.unwrap().as_deref(),
            Some("https://example.com/w/1")
        );
    }

    #[tokio::test]
    async fn test_chunks_replaced_by_title_and_index() {
        let index = index();
        index
            .upsert_chunks(&[chunk("A", Some(1), 0, "old text"), chunk("B", Some(1), 0, "other")])
            .await
            .unwrap();
        index
            .upsert_chunks(&[chunk("A", Some(1), 0, "new text")])
            .await
            .unwrap();

        assert_eq!(index.chunk_count().unwrap(), 2);
        let results = index
            .query_content("text", &build_filter(Some("A"), None), 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "new text");
    }

    #[tokio::test]
    async fn test_filtered_content_query() {
        let index = index();
        index
            .upsert_chunks(&[
                chunk("A", Some(1), 0, "widgets are small components"),
                chunk("A", Some(2), 1, "widgets compose into layouts"),
                chunk("B", Some(1), 0, "widgets in another course"),
            ])
            .await
            .unwrap();

        let results = index
            .query_content("widgets", &build_filter(Some("A"), Some(2)), 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.lesson_number, Some(2));
        assert_eq!(results[0].chunk.course_title, "A");

        let limited = index
            .query_content("widgets", &ContentFilter::unrestricted(), 2)
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert!(limited[0].distance <= limited[1].distance);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let index = index();
        index.upsert_course(&CourseMetadata::new("A")).await.unwrap();
        index
            .upsert_chunks(&[chunk("A", None, 0, "text")])
            .await
            .unwrap();

        index.clear_all().await.unwrap();
        assert_eq!(index.course_count().await.unwrap(), 0);
        assert_eq!(index.chunk_count().unwrap(), 0);
    }
}
