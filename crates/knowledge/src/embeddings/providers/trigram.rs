//! Character-trigram embeddings for offline operation.

use crate::embeddings::provider::EmbeddingProvider;
use coursewise_core::AppResult;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "does", "do", "about",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Trigram-based embedding provider.
///
/// Deterministic and content-dependent rather than semantic: texts that share
/// words land close together. Course-name resolution with this provider
/// follows its own calibration:
///
/// | query vs. stored title          | distance  |
/// |---------------------------------|-----------|
/// | exact title                     | 0.0       |
/// | one shared word ("Widgets" vs "Intro to Widgets") | ~0.37 |
/// | no shared words                 | ~2.0      |
/// | text with no embeddable tokens  | 1.0       |
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, bytes: &[u8], multiplier: u64) -> usize {
        let hash = bytes
            .iter()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(*b as u64));
        (hash % self.dimensions as u64) as usize
    }

    /// Embed one text. Returns the zero vector when nothing is embeddable.
    fn generate_trigram_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty() && !stop_words().contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();

            if chars.len() > 2 {
                for window in chars.windows(3) {
                    let trigram: String = window.iter().collect();
                    let dim = self.bucket(trigram.as_bytes(), 37);
                    embedding[dim] += (*freq as f32).sqrt();
                }
            }

            // Whole-word component; the only one for short tokens like "ai"
            let dim = self.bucket(word.as_bytes(), 31);
            embedding[dim] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_trigram_embedding(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::squared_distance;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_single() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_trigram_provider_deterministic() {
        let provider = TrigramProvider::new(384);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_punctuation_and_case_ignored() {
        let provider = TrigramProvider::new(384);
        let a = provider.embed("Intro to Widgets").await.unwrap();
        let b = provider.embed("intro, to WIDGETS!").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_empty_and_stop_word_text_is_zero_vector() {
        let provider = TrigramProvider::new(384);
        for text in ["", "the and of", "?!"] {
            let embedding = provider.embed(text).await.unwrap();
            assert!(embedding.iter().all(|&x| x == 0.0), "{:?}", text);
        }
    }

    #[tokio::test]
    async fn test_short_tokens_still_embed() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("AI").await.unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_shared_word_is_closer_than_unrelated() {
        let provider = TrigramProvider::new(384);
        let title = provider.embed("Intro to Widgets").await.unwrap();
        let partial = provider.embed("Widgets").await.unwrap();
        let unrelated = provider.embed("Completely Unrelated Zyx").await.unwrap();

        let near = squared_distance(&title, &partial);
        let far = squared_distance(&title, &unrelated);
        assert!(near < 1.0, "partial match distance {}", near);
        assert!(far > 1.6, "unrelated distance {}", far);
    }

    #[tokio::test]
    async fn test_utf8_text() {
        let provider = TrigramProvider::new(384);
        let embedding = provider
            .embed("Introdução à programação 🎮 com acentuação")
            .await
            .unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
