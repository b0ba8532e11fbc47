//! `search_course_content`: filtered semantic search over lesson content.

use super::tools::{str_arg, u32_arg, Tool};
use crate::filter::build_filter;
use crate::index::SemanticIndex;
use crate::resolver::CourseResolver;
use crate::types::{ChunkMatch, CourseMetadata, SourceCitation};
use coursewise_core::AppResult;
use coursewise_llm::ToolDefinition;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// A retrieval that found nothing. Rendered as text for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMiss {
    /// The course reference did not resolve
    CourseNotFound(String),

    /// Valid filters, zero matches
    NoContent {
        course_title: Option<String>,
        lesson_number: Option<u32>,
    },
}

impl fmt::Display for SearchMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CourseNotFound(name) => write!(f, "No course found matching '{}'", name),
            Self::NoContent {
                course_title,
                lesson_number,
            } => {
                write!(f, "No relevant content found")?;
                if let Some(title) = course_title {
                    write!(f, " in course '{}'", title)?;
                }
                if let Some(n) = lesson_number {
                    write!(f, " in lesson {}", n)?;
                }
                write!(f, ".")
            }
        }
    }
}

/// Search tool backed by the content collection.
pub struct SearchCourseContentTool {
    index: Arc<dyn SemanticIndex>,
    resolver: CourseResolver,
    max_results: usize,
}

impl SearchCourseContentTool {
    pub fn new(index: Arc<dyn SemanticIndex>, resolver: CourseResolver, max_results: usize) -> Self {
        Self {
            index,
            resolver,
            max_results,
        }
    }

    /// Resolve the course, compose the filter and query the content collection.
    pub async fn retrieve(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> AppResult<Result<Vec<ChunkMatch>, SearchMiss>> {
        let resolved = match course_name {
            Some(name) => match self.resolver.resolve(name).await? {
                Some(title) => Some(title),
                None => return Ok(Err(SearchMiss::CourseNotFound(name.to_string()))),
            },
            None => None,
        };

        let filter = build_filter(resolved.as_deref(), lesson_number);
        let matches = self
            .index
            .query_content(query, &filter, self.max_results)
            .await?;

        if matches.is_empty() {
            return Ok(Err(SearchMiss::NoContent {
                course_title: filter.course_title,
                lesson_number: filter.lesson_number,
            }));
        }

        Ok(Ok(matches))
    }

    /// Run a search and render the result text, appending one citation per chunk.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        sources: &mut Vec<SourceCitation>,
    ) -> AppResult<String> {
        match self.retrieve(query, course_name, lesson_number).await? {
            Ok(matches) => self.format_results(&matches, sources).await,
            Err(miss) => {
                tracing::debug!("Search miss: {}", miss);
                Ok(miss.to_string())
            }
        }
    }

    async fn format_results(
        &self,
        matches: &[ChunkMatch],
        sources: &mut Vec<SourceCitation>,
    ) -> AppResult<String> {
        let mut courses: HashMap<String, Option<CourseMetadata>> = HashMap::new();
        let mut blocks = Vec::with_capacity(matches.len());

        for m in matches {
            let chunk = &m.chunk;
            if !courses.contains_key(&chunk.course_title) {
                let course = self.index.get_course(&chunk.course_title).await?;
                courses.insert(chunk.course_title.clone(), course);
            }

            let lesson_link = chunk.lesson_number.and_then(|n| {
                courses
                    .get(&chunk.course_title)
                    .and_then(Option::as_ref)
                    .and_then(|c| c.lesson_link(n))
                    .map(str::to_string)
            });

            let citation = SourceCitation {
                course_title: chunk.course_title.clone(),
                lesson_number: chunk.lesson_number,
                lesson_link,
            };
            blocks.push(format!("[{}]\n{}", citation.label(), chunk.text));
            sources.push(citation);
        }

        Ok(blocks.join("\n\n"))
    }
}

#[async_trait::async_trait]
impl Tool for SearchCourseContentTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, args: &Value, sources: &mut Vec<SourceCitation>) -> AppResult<String> {
        let query = str_arg(args, "query")?.unwrap_or_default();
        let course_name = str_arg(args, "course_name")?;
        let lesson_number = u32_arg(args, "lesson_number")?;

        self.search(query, course_name, lesson_number, sources).await
    }
}
