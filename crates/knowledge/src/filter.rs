//! Content filters built from a resolved course title and lesson number.

use crate::types::ContentChunk;
use serde::Serialize;

/// Restriction on content queries. Both fields set means both must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl ContentFilter {
    /// No restriction.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Whether a chunk passes the filter.
    pub fn matches(&self, chunk: &ContentChunk) -> bool {
        let course_ok = self
            .course_title
            .as_deref()
            .map_or(true, |t| chunk.course_title == t);
        let lesson_ok = self
            .lesson_number
            .map_or(true, |n| chunk.lesson_number == Some(n));
        course_ok && lesson_ok
    }

    /// SQL predicate for LanceDB, or `None` when unrestricted.
    pub fn to_sql(&self) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(title) = &self.course_title {
            clauses.push(format!("course_title = '{}'", escape_sql(title)));
        }
        if let Some(n) = self.lesson_number {
            clauses.push(format!("lesson_number = {}", n));
        }

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }
}

/// Build a filter from an already-resolved course title and a lesson number.
///
/// The title must come from the resolver; lesson numbers always match exactly.
pub fn build_filter(resolved_title: Option<&str>, lesson_number: Option<u32>) -> ContentFilter {
    ContentFilter {
        course_title: resolved_title.map(str::to_string),
        lesson_number,
    }
}

/// Escape a string literal for a LanceDB SQL predicate.
pub(crate) fn escape_sql(value: &str) -> String {
    value.replace('\'', "''")
}
