//! Test doubles: a scripted reasoning engine and an index that counts queries.

use crate::embeddings::TrigramProvider;
use crate::filter::ContentFilter;
use crate::index::{MemoryIndex, SemanticIndex};
use crate::rag::RagSystem;
use crate::types::{ChunkMatch, ContentChunk, CourseMatch, CourseMetadata};
use coursewise_core::{AppError, AppResult, RagConfig};
use coursewise_llm::{ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmUsage, StopReason};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const WIDGETS_DOC: &str = "Course Title: Intro to Widgets
Course Link: https://example.com/widgets
Course Instructor: Ada Lovelace

Lesson 1: What Widgets Are
Lesson Link: https://example.com/widgets/1
Widgets are small.
";

pub const GADGETS_DOC: &str = "Course Title: Advanced Gadgets
Course Instructor: Grace Hopper

Lesson 1: Gadget Anatomy
Gadgets are large and complicated.
";

/// Replays canned responses and records every request.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Llm("engine unavailable".to_string()))
    }
}

pub fn text(answer: &str) -> ChatResponse {
    ChatResponse::from_text("scripted", answer)
}

/// A response requesting the given `(id, name, input)` tool calls.
pub fn tool_calls(calls: &[(&str, &str, serde_json::Value)]) -> ChatResponse {
    ChatResponse {
        content: calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: input.clone(),
            })
            .collect(),
        stop_reason: StopReason::ToolUse,
        model: "scripted".to_string(),
        usage: LlmUsage::default(),
    }
}

/// Memory index that counts content queries and can be told to fail them.
pub struct CountingIndex {
    inner: MemoryIndex,
    content_queries: AtomicUsize,
    content_down: AtomicBool,
}

impl CountingIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryIndex::new(Arc::new(TrigramProvider::new(384))),
            content_queries: AtomicUsize::new(0),
            content_down: AtomicBool::new(false),
        })
    }

    /// Make every later content query fail as if the store were unreachable.
    pub fn fail_content_queries(&self) {
        self.content_down.store(true, Ordering::SeqCst);
    }

    pub fn content_queries(&self) -> usize {
        self.content_queries.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SemanticIndex for CountingIndex {
    async fn upsert_course(&self, course: &CourseMetadata) -> AppResult<()> {
        self.inner.upsert_course(course).await
    }

    async fn upsert_chunks(&self, chunks: &[ContentChunk]) -> AppResult<()> {
        self.inner.upsert_chunks(chunks).await
    }

    async fn query_catalog(&self, text: &str, top_k: usize) -> AppResult<Vec<CourseMatch>> {
        self.inner.query_catalog(text, top_k).await
    }

    async fn query_content(
        &self,
        text: &str,
        filter: &ContentFilter,
        top_k: usize,
    ) -> AppResult<Vec<ChunkMatch>> {
        self.content_queries.fetch_add(1, Ordering::SeqCst);
        if self.content_down.load(Ordering::SeqCst) {
            return Err(AppError::Index("content collection unreachable".to_string()));
        }
        self.inner.query_content(text, filter, top_k).await
    }

    async fn clear_all(&self) -> AppResult<()> {
        self.inner.clear_all().await
    }

    async fn course_titles(&self) -> AppResult<Vec<String>> {
        self.inner.course_titles().await
    }

    async fn get_course(&self, title: &str) -> AppResult<Option<CourseMetadata>> {
        self.inner.get_course(title).await
    }
}

/// A loaded system over the widgets and gadgets courses.
pub struct Fixture {
    pub system: RagSystem,
    pub client: Arc<ScriptedClient>,
    pub index: Arc<CountingIndex>,
    pub docs: TempDir,
}

pub async fn fixture(responses: Vec<ChatResponse>) -> Fixture {
    let docs = TempDir::new().unwrap();
    std::fs::write(docs.path().join("widgets.txt"), WIDGETS_DOC).unwrap();
    std::fs::write(docs.path().join("gadgets.txt"), GADGETS_DOC).unwrap();

    let index = CountingIndex::new();
    let client = ScriptedClient::new(responses);
    let system = RagSystem::new(
        &RagConfig::default(),
        index.clone(),
        client.clone(),
        "scripted-model",
        coursewise_prompt::defaults::course_assistant(),
    )
    .unwrap();

    system.clear_and_reload(docs.path(), false).await.unwrap();

    Fixture {
        system,
        client,
        index,
        docs,
    }
}
