//! RAG response types.

use crate::types::SourceCitation;
use serde::{Deserialize, Serialize};

/// Answer to one query.
///
/// `sources` holds the citations of every chunk retrieved while answering,
/// in retrieval order. It is empty when the engine answered without tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Natural language answer from the reasoning engine
    pub answer: String,

    pub sources: Vec<SourceCitation>,
}

impl AnswerResult {
    pub fn new(answer: impl Into<String>, sources: Vec<SourceCitation>) -> Self {
        Self {
            answer: answer.into(),
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_serialization() {
        let result = AnswerResult::new(
            "Widgets are small.",
            vec![SourceCitation {
                course_title: "Intro to Widgets".to_string(),
                lesson_number: Some(1),
                lesson_link: None,
            }],
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["answer"], "Widgets are small.");
        assert_eq!(json["sources"][0]["course_title"], "Intro to Widgets");
        assert!(json["sources"][0].get("lesson_link").is_none());
    }
}
