//! Course document parsing and chunking.
//!
//! A course document is plain text with a small header:
//!
//! ```text
//! Course Title: Intro to Widgets
//! Course Link: https://example.com/widgets
//! Course Instructor: Ada Lovelace
//!
//! Lesson 1: What Widgets Are
//! Lesson Link: https://example.com/widgets/1
//! Widgets are small...
//! ```
//!
//! Text before the first lesson marker becomes course-level content with no
//! lesson number.

use crate::types::{ContentChunk, CourseMetadata, LessonRef};
use coursewise_core::{AppError, AppResult, RagConfig};
use std::path::{Path, PathBuf};
use text_splitter::{ChunkConfig, TextSplitter};
use walkdir::WalkDir;

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

/// A parsed document before chunking.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCourse {
    pub metadata: CourseMetadata,

    /// Text before the first lesson marker
    pub preamble: String,

    /// Lesson number and body, in document order
    pub lesson_bodies: Vec<(u32, String)>,
}

/// Splits course documents into catalog entries and content chunks.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentLoader {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        let loader = Self {
            chunk_size,
            chunk_overlap,
        };
        loader.splitter()?;
        Ok(loader)
    }

    pub fn from_config(rag: &RagConfig) -> AppResult<Self> {
        Self::new(rag.chunk_size, rag.chunk_overlap)
    }

    fn splitter(&self) -> AppResult<TextSplitter<text_splitter::Characters>> {
        let config = ChunkConfig::new(self.chunk_size)
            .with_overlap(self.chunk_overlap)
            .map_err(|e| AppError::Knowledge(format!("Invalid chunking settings: {}", e)))?;
        Ok(TextSplitter::new(config))
    }

    /// Read, parse and chunk one document.
    pub fn load_file(&self, path: &Path) -> AppResult<(CourseMetadata, Vec<ContentChunk>)> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

        let parsed = parse_document(&raw)
            .map_err(|e| AppError::Knowledge(format!("{:?}: {}", path, e)))?;
        let chunks = self.chunk_course(&parsed)?;

        tracing::debug!(
            "Parsed {:?}: course '{}', {} lessons, {} chunks",
            path,
            parsed.metadata.title,
            parsed.metadata.lessons.len(),
            chunks.len()
        );

        Ok((parsed.metadata, chunks))
    }

    /// Chunk a parsed course. Ordinals run across the whole course.
    pub fn chunk_course(&self, parsed: &ParsedCourse) -> AppResult<Vec<ContentChunk>> {
        let splitter = self.splitter()?;
        let title = &parsed.metadata.title;
        let mut chunks = Vec::new();

        let mut push = |lesson_number: Option<u32>, text: String| {
            chunks.push(ContentChunk {
                course_title: title.clone(),
                lesson_number,
                chunk_index: chunks.len() as u32,
                text,
            });
        };

        for piece in splitter.chunks(&parsed.preamble) {
            push(None, piece.to_string());
        }

        for (number, body) in &parsed.lesson_bodies {
            for (i, piece) in splitter.chunks(body).enumerate() {
                let text = if i == 0 {
                    format!("Lesson {} content: {}", number, piece)
                } else {
                    piece.to_string()
                };
                push(Some(*number), text);
            }
        }

        Ok(chunks)
    }
}

/// Parse the header and lesson structure of a course document.
pub fn parse_document(raw: &str) -> AppResult<ParsedCourse> {
    let mut title = None;
    let mut course_link = None;
    let mut instructor = None;
    let mut lessons: Vec<LessonRef> = Vec::new();
    let mut preamble = Vec::new();
    let mut bodies: Vec<(u32, Vec<&str>)> = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        let in_header = lessons.is_empty();

        if let Some(value) = header_value(trimmed, "Course Title:").filter(|_| in_header) {
            title = Some(value);
        } else if let Some(value) = header_value(trimmed, "Course Link:").filter(|_| in_header) {
            course_link = Some(value);
        } else if let Some(value) =
            header_value(trimmed, "Course Instructor:").filter(|_| in_header)
        {
            instructor = Some(value);
        } else if let Some((number, lesson_title)) = lesson_marker(trimmed) {
            lessons.push(LessonRef {
                number,
                title: lesson_title,
                link: None,
            });
            bodies.push((number, Vec::new()));
        } else if let (Some(value), Some(lesson)) =
            (header_value(trimmed, "Lesson Link:"), lessons.last_mut())
        {
            // Only the line right after the marker counts as the link
            match bodies.last() {
                Some((_, body)) if body.is_empty() && lesson.link.is_none() => {
                    lesson.link = Some(value)
                }
                _ => push_line(&mut bodies, &mut preamble, line),
            }
        } else {
            push_line(&mut bodies, &mut preamble, line);
        }
    }

    let title = title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Knowledge("Missing 'Course Title:' header".to_string()))?;

    Ok(ParsedCourse {
        metadata: CourseMetadata {
            title,
            instructor,
            course_link,
            lessons,
        },
        preamble: preamble.join("\n").trim().to_string(),
        lesson_bodies: bodies
            .into_iter()
            .map(|(n, lines)| (n, lines.join("\n").trim().to_string()))
            .collect(),
    })
}

fn push_line<'a>(bodies: &mut [(u32, Vec<&'a str>)], preamble: &mut Vec<&'a str>, line: &'a str) {
    match bodies.last_mut() {
        Some((_, body)) => body.push(line),
        None => preamble.push(line),
    }
}

fn header_value(line: &str, prefix: &str) -> Option<String> {
    line.strip_prefix(prefix).map(|v| v.trim().to_string())
}

/// `Lesson <n>: <title>`
fn lesson_marker(line: &str) -> Option<(u32, String)> {
    let rest = line.strip_prefix("Lesson ")?;
    let (number, title) = rest.split_once(':')?;
    let number = number.trim().parse().ok()?;
    Some((number, title.trim().to_string()))
}

/// Course documents under `folder`, sorted by path.
pub fn discover_documents(folder: &Path) -> AppResult<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Course folder {:?} does not exist",
            folder
        )));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
        })
        .collect();

    paths.sort();
    Ok(paths)
}
