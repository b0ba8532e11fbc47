//! The serving surface: answer questions, reload the corpus, manage sessions.

use super::orchestrator::Orchestrator;
use super::outline_tool::CourseOutlineTool;
use super::search_tool::SearchCourseContentTool;
use super::session::SessionManager;
use super::tools::ToolRegistry;
use super::types::AnswerResult;
use crate::index::{open_index, SemanticIndex};
use crate::loader::{discover_documents, DocumentLoader};
use crate::resolver::CourseResolver;
use crate::types::{CourseAnalytics, LoadStats, SourceCitation};
use chrono::Utc;
use coursewise_core::{AppConfig, AppResult, RagConfig};
use coursewise_llm::{create_client_from_config, LlmClient};
use coursewise_prompt::{build_course_prompt, load_course_assistant, PromptDefinition};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Course question answering over one semantic index.
///
/// Shareable across tasks behind an `Arc`. Each call to [`answer`] gets its
/// own tool dispatcher, so citations never leak between queries.
///
/// [`answer`]: RagSystem::answer
pub struct RagSystem {
    index: Arc<dyn SemanticIndex>,
    loader: DocumentLoader,
    search_tool: Arc<SearchCourseContentTool>,
    tools: ToolRegistry,
    orchestrator: Orchestrator,
    sessions: SessionManager,
    prompt: PromptDefinition,
}

impl RagSystem {
    pub fn new(
        rag: &RagConfig,
        index: Arc<dyn SemanticIndex>,
        client: Arc<dyn LlmClient>,
        model: &str,
        prompt: PromptDefinition,
    ) -> AppResult<Self> {
        let resolver = CourseResolver::new(index.clone(), rag.similarity_threshold);
        let search_tool = Arc::new(SearchCourseContentTool::new(
            index.clone(),
            resolver.clone(),
            rag.max_results,
        ));

        let mut tools = ToolRegistry::new();
        tools.register(search_tool.clone());
        tools.register(Arc::new(CourseOutlineTool::new(index.clone(), resolver)));

        Ok(Self {
            loader: DocumentLoader::from_config(rag)?,
            orchestrator: Orchestrator::new(client, model)
                .with_sampling(rag.max_tokens, rag.temperature),
            sessions: SessionManager::new(rag.max_history),
            index,
            search_tool,
            tools,
            prompt,
        })
    }

    /// Build the index, engine client and prompt described by `config`.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let index = open_index(config).await?;
        let client = create_client_from_config(config)?;
        let prompt = load_course_assistant(&config.workspace)?;

        tracing::debug!(
            "RAG system ready (provider: {}, model: {}, threshold: {})",
            config.provider,
            config.model,
            config.rag.similarity_threshold
        );
        Self::new(&config.rag, index, client, &config.model, prompt)
    }

    pub fn index(&self) -> &Arc<dyn SemanticIndex> {
        &self.index
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Answer a question, optionally within a conversation.
    ///
    /// The session history is updated only when the answer succeeds.
    pub async fn answer(&self, query: &str, session_id: Option<&str>) -> AppResult<AnswerResult> {
        let history = match session_id {
            Some(id) => self.sessions.get_history(id)?,
            None => None,
        };

        let prompt = build_course_prompt(&self.prompt, query, history.as_deref())?;
        let result = self
            .orchestrator
            .run(&prompt.system, &prompt.user, &self.tools)
            .await?;

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &result.answer)?;
        }

        tracing::info!(
            "Answered query ({} chars, {} sources, history: {})",
            result.answer.len(),
            result.sources.len(),
            prompt.metadata.history_included
        );
        Ok(result)
    }

    /// Load every course document under `folder`.
    ///
    /// Courses whose title is already in the catalog are skipped unless
    /// `force_rebuild`, which clears the index first. Unreadable documents
    /// are counted and skipped; index failures abort the load.
    pub async fn clear_and_reload(&self, folder: &Path, force_rebuild: bool) -> AppResult<LoadStats> {
        let start = Instant::now();
        let mut stats = LoadStats::default();

        if force_rebuild {
            tracing::info!("Clearing index before reload");
            self.index.clear_all().await?;
        }

        let mut known: HashSet<String> = self.index.course_titles().await?.into_iter().collect();

        for path in discover_documents(folder)? {
            let (course, chunks) = match self.loader.load_file(&path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    stats.failed += 1;
                    continue;
                }
            };

            if known.contains(&course.title) {
                tracing::debug!("Course '{}' already loaded, skipping", course.title);
                stats.skipped += 1;
                continue;
            }

            self.index.upsert_course(&course).await?;
            self.index.upsert_chunks(&chunks).await?;

            stats.courses_added += 1;
            stats.chunks_added += chunks.len() as u32;
            known.insert(course.title);
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        stats.loaded_at = Utc::now();

        tracing::info!(
            "Loaded {} courses, {} chunks ({} skipped, {} failed) in {:.2}s",
            stats.courses_added,
            stats.chunks_added,
            stats.skipped,
            stats.failed,
            stats.duration_secs
        );
        Ok(stats)
    }

    pub async fn course_analytics(&self) -> AppResult<CourseAnalytics> {
        let course_titles = self.index.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    /// Run the content search directly, without the engine.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> AppResult<(String, Vec<SourceCitation>)> {
        let mut sources = Vec::new();
        let text = self
            .search_tool
            .search(query, course_name, lesson_number, &mut sources)
            .await?;
        Ok((text, sources))
    }

    pub fn create_session(&self) -> AppResult<String> {
        self.sessions.create_session()
    }

    pub fn clear_session(&self, session_id: &str) -> AppResult<()> {
        self.sessions.clear_session(session_id)
    }
}
