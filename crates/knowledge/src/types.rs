//! Course knowledge type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One lesson entry in a course outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRef {
    /// Lesson number as written in the source document
    pub number: u32,

    /// Lesson title
    pub title: String,

    /// Link to the lesson page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Catalog entry for one course. The title is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMetadata {
    /// Course title, unique across the catalog
    pub title: String,

    /// Instructor name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,

    /// Link to the course page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_link: Option<String>,

    /// Lessons in document order
    #[serde(default)]
    pub lessons: Vec<LessonRef>,
}

impl CourseMetadata {
    /// Create a course with no optional fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            instructor: None,
            course_link: None,
            lessons: Vec::new(),
        }
    }

    /// Link of the given lesson, if both the lesson and its link exist.
    pub fn lesson_link(&self, lesson_number: u32) -> Option<&str> {
        self.lessons
            .iter()
            .find(|l| l.number == lesson_number)
            .and_then(|l| l.link.as_deref())
    }
}

/// A retrievable slice of lesson text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Owning course title (not enforced against the catalog)
    pub course_title: String,

    /// Lesson the chunk belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,

    /// Ordinal of the chunk within its course
    pub chunk_index: u32,

    /// Chunk text
    pub text: String,
}

/// Catalog query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseMatch {
    pub title: String,

    /// Squared L2 distance between normalized vectors, lower is closer
    pub distance: f32,
}

/// Content query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMatch {
    pub chunk: ContentChunk,
    pub distance: f32,
}

/// Where a piece of an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub course_title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_link: Option<String>,
}

impl SourceCitation {
    /// Display label: `"<title> - Lesson <n>"` or just the title.
    pub fn label(&self) -> String {
        match self.lesson_number {
            Some(n) => format!("{} - Lesson {}", self.course_title, n),
            None => self.course_title.clone(),
        }
    }
}

impl std::fmt::Display for SourceCitation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())?;
        if let Some(link) = &self.lesson_link {
            write!(f, " ({})", link)?;
        }
        Ok(())
    }
}

/// Statistics from a folder load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadStats {
    /// Courses added to the catalog
    pub courses_added: u32,

    /// Chunks added to the content collection
    pub chunks_added: u32,

    /// Files skipped because their course was already loaded
    pub skipped: u32,

    /// Files that could not be read or parsed
    pub failed: u32,

    /// Wall time of the load
    pub duration_secs: f64,

    pub loaded_at: DateTime<Utc>,
}

/// Catalog summary.
#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_label() {
        let with_lesson = SourceCitation {
            course_title: "Course A".to_string(),
            lesson_number: Some(1),
            lesson_link: Some("https://example.com/a/1".to_string()),
        };
        assert_eq!(with_lesson.label(), "Course A - Lesson 1");
        assert_eq!(
            with_lesson.to_string(),
            "Course A - Lesson 1 (https://example.com/a/1)"
        );

        let course_only = SourceCitation {
            course_title: "Course A".to_string(),
            lesson_number: None,
            lesson_link: None,
        };
        assert_eq!(course_only.to_string(), "Course A");
    }

    #[test]
    fn test_lesson_link_lookup() {
        let mut course = CourseMetadata::new("Intro to Widgets");
        course.lessons.push(LessonRef {
            number: 1,
            title: "Getting Started".to_string(),
            link: Some("https://example.com/widgets/1".to_string()),
        });
        course.lessons.push(LessonRef {
            number: 2,
            title: "No Link".to_string(),
            link: None,
        });

        assert_eq!(course.lesson_link(1), Some("https://example.com/widgets/1"));
        assert_eq!(course.lesson_link(2), None);
        assert_eq!(course.lesson_link(9), None);
    }
}
