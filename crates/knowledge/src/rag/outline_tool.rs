//! `get_course_outline`: course title, link, instructor and lesson list.

use super::search_tool::SearchMiss;
use super::tools::{str_arg, Tool};
use crate::index::SemanticIndex;
use crate::resolver::CourseResolver;
use crate::types::{CourseMetadata, SourceCitation};
use coursewise_core::{AppError, AppResult};
use coursewise_llm::ToolDefinition;
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::Arc;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

pub struct CourseOutlineTool {
    index: Arc<dyn SemanticIndex>,
    resolver: CourseResolver,
}

impl CourseOutlineTool {
    pub fn new(index: Arc<dyn SemanticIndex>, resolver: CourseResolver) -> Self {
        Self { index, resolver }
    }

    pub async fn outline(&self, course_name: &str) -> AppResult<String> {
        let course = match self.resolver.resolve(course_name).await? {
            Some(title) => self.index.get_course(&title).await?,
            None => None,
        };

        Ok(match course {
            Some(course) => render_outline(&course),
            None => SearchMiss::CourseNotFound(course_name.to_string()).to_string(),
        })
    }
}

fn render_outline(course: &CourseMetadata) -> String {
    let mut out = format!("Course: {}", course.title);
    if let Some(link) = &course.course_link {
        let _ = write!(out, "\nLink: {}", link);
    }
    if let Some(instructor) = &course.instructor {
        let _ = write!(out, "\nInstructor: {}", instructor);
    }

    let _ = write!(out, "\nLessons ({}):", course.lessons.len());
    for lesson in &course.lessons {
        let _ = write!(out, "\n  Lesson {}: {}", lesson.number, lesson.title);
    }
    out
}

#[async_trait::async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &str {
        OUTLINE_TOOL_NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get the outline of a course: title, link, instructor and the numbered list of lessons"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work)"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, args: &Value, _sources: &mut Vec<SourceCitation>) -> AppResult<String> {
        let course_name = str_arg(args, "course_name")?.ok_or_else(|| {
            AppError::InvalidToolArguments(format!("{}: 'course_name' is empty", OUTLINE_TOOL_NAME))
        })?;
        self.outline(course_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TrigramProvider;
    use crate::index::MemoryIndex;
    use crate::types::LessonRef;

    async fn tool() -> CourseOutlineTool {
        let index: Arc<dyn SemanticIndex> =
            Arc::new(MemoryIndex::new(Arc::new(TrigramProvider::new(384))));
        index
            .upsert_course(&CourseMetadata {
                title: "Intro to Widgets".to_string(),
                instructor: Some("Ada Lovelace".to_string()),
                course_link: Some("https://example.com/widgets".to_string()),
                lessons: vec![
                    LessonRef {
                        number: 0,
                        title: "Welcome".to_string(),
                        link: None,
                    },
                    LessonRef {
                        number: 1,
                        title: "What Widgets Are".to_string(),
                        link: None,
                    },
                ],
            })
            .await
            .unwrap();
        CourseOutlineTool::new(index.clone(), CourseResolver::new(index, 1.6))
    }

    #[tokio::test]
    async fn test_outline_of_partial_name() {
        let out = tool()
            .await
            .execute(&json!({"course_name": "Widgets"}), &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(
            out,
            "Course: Intro to Widgets\nLink: https://example.com/widgets\nInstructor: Ada Lovelace\nLessons (2):\n  Lesson 0: Welcome\n  Lesson 1: What Widgets Are"
        );
    }

    #[tokio::test]
    async fn test_outline_unknown_course() {
        let out = tool().await.outline("Completely Unrelated Zyx").await.unwrap();
        assert_eq!(out, "No course found matching 'Completely Unrelated Zyx'");
    }

    #[tokio::test]
    async fn test_blank_course_name_rejected() {
        let err = tool()
            .await
            .execute(&json!({"course_name": " "}), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToolArguments(_)));
    }
}
