//! Fuzzy course-name resolution against the catalog collection.

use crate::index::SemanticIndex;
use coursewise_core::AppResult;
use std::sync::Arc;

/// Maps a loosely written course reference onto an exact catalog title.
///
/// The single nearest catalog entry is accepted when its distance is at or
/// below the threshold. There is no secondary ranking and no substring
/// fallback.
#[derive(Clone)]
pub struct CourseResolver {
    index: Arc<dyn SemanticIndex>,
    threshold: f32,
}

impl CourseResolver {
    pub fn new(index: Arc<dyn SemanticIndex>, threshold: f32) -> Self {
        Self { index, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Exact catalog title for `raw`, or `None` when nothing is close enough.
    pub async fn resolve(&self, raw: &str) -> AppResult<Option<String>> {
        let best = self.index.query_catalog(raw, 1).await?.into_iter().next();

        let Some(best) = best else {
            tracing::debug!("Catalog empty, cannot resolve '{}'", raw);
            return Ok(None);
        };

        if best.distance <= self.threshold {
            tracing::debug!(
                "Resolved '{}' to '{}' (distance {:.3})",
                raw,
                best.title,
                best.distance
            );
            Ok(Some(best.title))
        } else {
            tracing::debug!(
                "Rejected '{}': nearest '{}' at {:.3} exceeds threshold {:.3}",
                raw,
                best.title,
                best.distance,
                self.threshold
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TrigramProvider;
    use crate::index::MemoryIndex;
    use crate::types::CourseMetadata;

    async fn resolver_with(titles: &[&str], threshold: f32) -> CourseResolver {
        let index = Arc::new(MemoryIndex::new(Arc::new(TrigramProvider::new(384))));
        for title in titles {
            index.upsert_course(&CourseMetadata::new(*title)).await.unwrap();
        }
        CourseResolver::new(index, threshold)
    }

    #[tokio::test]
    async fn test_every_title_resolves_to_itself() {
        let titles = ["Intro to Widgets", "Advanced Gadgets"];
        let resolver = resolver_with(&titles, 1.6).await;

        for title in titles {
            assert_eq!(resolver.resolve(title).await.unwrap().as_deref(), Some(title));
        }
    }

    #[tokio::test]
    async fn test_partial_name_resolves() {
        let resolver = resolver_with(&["Intro to Widgets", "Advanced Gadgets"], 1.6).await;
        assert_eq!(
            resolver.resolve("Widgets").await.unwrap().as_deref(),
            Some("Intro to Widgets")
        );
    }

    #[tokio::test]
    async fn test_unrelated_name_rejected() {
        let resolver = resolver_with(&["Intro to Widgets", "Advanced Gadgets"], 1.6).await;
        assert_eq!(resolver.resolve("Completely Unrelated Zyx").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_not_found() {
        let resolver = resolver_with(&[], 1.6).await;
        assert_eq!(resolver.resolve("Intro to Widgets").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive_and_configurable() {
        let strict = resolver_with(&["Intro to Widgets"], 0.1).await;
        assert_eq!(strict.resolve("Widgets").await.unwrap(), None);
        assert_eq!(
            strict.resolve("Intro to Widgets").await.unwrap().as_deref(),
            Some("Intro to Widgets")
        );

        let zero = resolver_with(&["Intro to Widgets"], 0.0).await;
        assert!(zero.resolve("Intro to Widgets").await.unwrap().is_some());
    }
}
