//! LanceDB-backed semantic index.
//!
//! Two tables live under the index directory: `catalog` (one row per course)
//! and `content` (one row per chunk). A manifest records which embedding
//! model produced the stored vectors.

use super::{squared_distance, SemanticIndex};
use crate::embeddings::EmbeddingProvider;
use crate::filter::{escape_sql, ContentFilter};
use crate::types::{ChunkMatch, ContentChunk, CourseMatch, CourseMetadata, LessonRef};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use chrono::{DateTime, Utc};
use coursewise_core::{AppError, AppResult};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

const CATALOG_TABLE: &str = "catalog";
const CONTENT_TABLE: &str = "content";
const MANIFEST_FILE: &str = "manifest.yaml";

/// Embedding model that produced the stored vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexManifest {
    provider: String,
    model: String,
    dimensions: usize,
    created_at: DateTime<Utc>,
}

impl IndexManifest {
    fn for_embedder(embedder: &dyn EmbeddingProvider) -> Self {
        Self {
            provider: embedder.provider_name().to_string(),
            model: embedder.model_name().to_string(),
            dimensions: embedder.dimensions(),
            created_at: Utc::now(),
        }
    }

    fn same_model(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.model == other.model
            && self.dimensions == other.dimensions
    }
}

/// LanceDB semantic index.
///
/// Writes and `clear_all` hold the gate exclusively, so readers never see a
/// catalog and content collection from different generations.
pub struct LanceDbIndex {
    catalog: Table,
    content: Table,
    embedder: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
    gate: RwLock<()>,
}

impl LanceDbIndex {
    /// Open or create the index at `db_path`.
    ///
    /// If the stored vectors came from a different embedding model the
    /// directory is wiped and recreated empty; documents must be reloaded.
    pub async fn open(db_path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        let wanted = IndexManifest::for_embedder(embedder.as_ref());
        prepare_directory(db_path, &wanted)?;

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to connect to LanceDB: {}", e)))?;

        let dimensions = embedder.dimensions();
        let catalog = open_or_create(&conn, CATALOG_TABLE, catalog_schema(dimensions)).await?;
        let content = open_or_create(&conn, CONTENT_TABLE, content_schema(dimensions)).await?;

        tracing::debug!(
            "Opened LanceDB index at {:?} (model {}, {} dims)",
            db_path,
            wanted.model,
            dimensions
        );

        Ok(Self {
            catalog,
            content,
            embedder,
            dimensions,
            gate: RwLock::new(()),
        })
    }

    fn embedding_array(&self, embeddings: &[Vec<f32>]) -> AppResult<FixedSizeListArray> {
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(AppError::Index(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                bad.len()
            )));
        }

        let flat: Vec<f32> = embeddings.iter().flatten().copied().collect();
        FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.dimensions as i32,
            Arc::new(Float32Array::from(flat)),
            None,
        )
        .map_err(|e| AppError::Index(format!("Failed to build embedding column: {}", e)))
    }

    fn course_batch(&self, course: &CourseMetadata, embedding: Vec<f32>) -> AppResult<RecordBatch> {
        let lessons_json = serde_json::to_string(&course.lessons)?;

        RecordBatch::try_new(
            catalog_schema(self.dimensions),
            vec![
                Arc::new(StringArray::from(vec![course.title.as_str()])),
                Arc::new(StringArray::from(vec![course.instructor.as_deref()])),
                Arc::new(StringArray::from(vec![course.course_link.as_deref()])),
                Arc::new(StringArray::from(vec![lessons_json.as_str()])),
                Arc::new(self.embedding_array(&[embedding])?),
            ],
        )
        .map_err(|e| AppError::Index(format!("Failed to create catalog batch: {}", e)))
    }

    fn chunk_batch(&self, chunks: &[ContentChunk], embeddings: &[Vec<f32>]) -> AppResult<RecordBatch> {
        let titles: Vec<&str> = chunks.iter().map(|c| c.course_title.as_str()).collect();
        let lessons: Vec<Option<u32>> = chunks.iter().map(|c| c.lesson_number).collect();
        let indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        RecordBatch::try_new(
            content_schema(self.dimensions),
            vec![
                Arc::new(StringArray::from(titles)),
                Arc::new(UInt32Array::from(lessons)),
                Arc::new(UInt32Array::from(indices)),
                Arc::new(StringArray::from(texts)),
                Arc::new(self.embedding_array(embeddings)?),
            ],
        )
        .map_err(|e| AppError::Index(format!("Failed to create content batch: {}", e)))
    }

    /// Top-k rows by L2 distance (LanceDB's default metric). Callers recompute
    /// the distance from the stored embedding.
    async fn nearest(
        &self,
        table: &Table,
        query: Vec<f32>,
        predicate: Option<String>,
        top_k: usize,
    ) -> AppResult<Vec<RecordBatch>> {
        let rows = table
            .count_rows(predicate.clone())
            .await
            .map_err(|e| AppError::Index(format!("Failed to count rows: {}", e)))?;
        if rows == 0 || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut search = table
            .query()
            .nearest_to(query)
            .map_err(|e| AppError::Index(format!("Failed to create query: {}", e)))?
            .limit(top_k);
        if let Some(predicate) = predicate {
            search = search.only_if(predicate);
        }

        search
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to execute search: {}", e)))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| AppError::Index(format!("Failed to collect results: {}", e)))
    }

    async fn scan_catalog(&self, predicate: Option<String>) -> AppResult<Vec<CourseMetadata>> {
        let mut query = self.catalog.query();
        if let Some(predicate) = predicate {
            query = query.only_if(predicate);
        }

        let batches: Vec<RecordBatch> = query
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to scan catalog: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Index(format!("Failed to collect catalog: {}", e)))?;

        let mut courses = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                courses.push(row_to_course(batch, row)?);
            }
        }
        Ok(courses)
    }
}

#[async_trait::async_trait]
impl SemanticIndex for LanceDbIndex {
    async fn upsert_course(&self, course: &CourseMetadata) -> AppResult<()> {
        let embedding = self.embedder.embed(&course.title).await?;
        let batch = self.course_batch(course, embedding)?;
        let schema = batch.schema();

        let _guard = self.gate.write().await;
        self.catalog
            .delete(&format!("title = '{}'", escape_sql(&course.title)))
            .await
            .map_err(|e| AppError::Index(format!("Failed to replace course: {}", e)))?;
        self.catalog
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to add course: {}", e)))?;

        tracing::debug!("Upserted course '{}'", course.title);
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[ContentChunk]) -> AppResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        let batch = self.chunk_batch(chunks, &embeddings)?;
        let schema = batch.schema();

        let mut by_course: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for chunk in chunks {
            by_course
                .entry(chunk.course_title.as_str())
                .or_default()
                .push(chunk.chunk_index.to_string());
        }

        let _guard = self.gate.write().await;
        for (title, indices) in by_course {
            let predicate = format!(
                "course_title = '{}' AND chunk_index IN ({})",
                escape_sql(title),
                indices.join(", ")
            );
            self.content
                .delete(&predicate)
                .await
                .map_err(|e| AppError::Index(format!("Failed to replace chunks: {}", e)))?;
        }

        self.content
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to add chunks: {}", e)))?;

        tracing::debug!("Batch inserted {} chunks into LanceDB", chunks.len());
        Ok(())
    }

    async fn query_catalog(&self, text: &str, top_k: usize) -> AppResult<Vec<CourseMatch>> {
        let query = self.embedder.embed(text).await?;

        let _guard = self.gate.read().await;
        let batches = self
            .nearest(&self.catalog, query.clone(), None, top_k)
            .await?;

        let mut matches = Vec::new();
        for batch in &batches {
            let titles = string_column(batch, "title")?;
            for row in 0..batch.num_rows() {
                matches.push(CourseMatch {
                    title: titles.value(row).to_string(),
                    distance: squared_distance(&query, &embedding_at(batch, row)?),
                });
            }
        }

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(matches)
    }

    async fn query_content(
        &self,
        text: &str,
        filter: &ContentFilter,
        top_k: usize,
    ) -> AppResult<Vec<ChunkMatch>> {
        let query = self.embedder.embed(text).await?;

        let _guard = self.gate.read().await;
        let batches = self
            .nearest(&self.content, query.clone(), filter.to_sql(), top_k)
            .await?;

        let mut matches = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                matches.push(ChunkMatch {
                    chunk: row_to_chunk(batch, row)?,
                    distance: squared_distance(&query, &embedding_at(batch, row)?),
                });
            }
        }

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        tracing::debug!(
            "Content query returned {} chunks (requested top-{})",
            matches.len(),
            top_k
        );
        Ok(matches)
    }

    async fn clear_all(&self) -> AppResult<()> {
        let _guard = self.gate.write().await;

        for (table, predicate) in [
            (&self.catalog, "title IS NOT NULL"),
            (&self.content, "course_title IS NOT NULL"),
        ] {
            let count = table
                .count_rows(None)
                .await
                .map_err(|e| AppError::Index(format!("Failed to count rows: {}", e)))?;
            if count > 0 {
                table
                    .delete(predicate)
                    .await
                    .map_err(|e| AppError::Index(format!("Failed to clear index: {}", e)))?;
            }
        }

        tracing::info!("Cleared LanceDB index");
        Ok(())
    }

    async fn course_titles(&self) -> AppResult<Vec<String>> {
        let _guard = self.gate.read().await;
        let mut titles: Vec<String> = self
            .scan_catalog(None)
            .await?
            .into_iter()
            .map(|c| c.title)
            .collect();
        titles.sort();
        Ok(titles)
    }

    async fn get_course(&self, title: &str) -> AppResult<Option<CourseMetadata>> {
        let _guard = self.gate.read().await;
        Ok(self
            .scan_catalog(Some(format!("title = '{}'", escape_sql(title))))
            .await?
            .into_iter()
            .next())
    }

    async fn course_count(&self) -> AppResult<usize> {
        let _guard = self.gate.read().await;
        self.catalog
            .count_rows(None)
            .await
            .map_err(|e| AppError::Index(format!("Failed to count rows: {}", e)))
    }
}

/// Make sure the directory exists and matches the configured embedding model.
fn prepare_directory(db_path: &Path, wanted: &IndexManifest) -> AppResult<()> {
    let manifest_path = db_path.join(MANIFEST_FILE);

    if manifest_path.exists() {
        let stored: IndexManifest = serde_yaml::from_str(&std::fs::read_to_string(&manifest_path)?)?;
        if stored.same_model(wanted) {
            return Ok(());
        }

        tracing::warn!(
            "Index at {:?} was built with {}/{} ({} dims); recreating it for {}/{} ({} dims). Reload course documents.",
            db_path,
            stored.provider,
            stored.model,
            stored.dimensions,
            wanted.provider,
            wanted.model,
            wanted.dimensions
        );
        std::fs::remove_dir_all(db_path)?;
    }

    std::fs::create_dir_all(db_path)
        .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;
    std::fs::write(&manifest_path, serde_yaml::to_string(wanted)?)?;
    Ok(())
}

async fn open_or_create(conn: &Connection, name: &str, schema: Arc<Schema>) -> AppResult<Table> {
    let table_names = conn
        .table_names()
        .execute()
        .await
        .map_err(|e| AppError::Index(format!("Failed to list tables: {}", e)))?;

    if table_names.iter().any(|t| t == name) {
        conn.open_table(name)
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to open table {}: {}", name, e)))
    } else {
        let empty_batch = RecordBatch::new_empty(schema.clone());
        conn.create_table(name, RecordBatchIterator::new(vec![Ok(empty_batch)], schema))
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to create table {}: {}", name, e)))
    }
}

fn embedding_field(dimensions: usize) -> Field {
    Field::new(
        "embedding",
        DataType::FixedSizeList(
            Arc::new(Field::new("item", DataType::Float32, true)),
            dimensions as i32,
        ),
        false,
    )
}

fn catalog_schema(dimensions: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("instructor", DataType::Utf8, true),
        Field::new("course_link", DataType::Utf8, true),
        Field::new("lessons_json", DataType::Utf8, false),
        embedding_field(dimensions),
    ]))
}

fn content_schema(dimensions: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("course_title", DataType::Utf8, false),
        Field::new("lesson_number", DataType::UInt32, true),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("text", DataType::Utf8, false),
        embedding_field(dimensions),
    ]))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::Index(format!("Invalid {} column", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
        .ok_or_else(|| AppError::Index(format!("Invalid {} column", name)))
}

fn optional_string(array: &StringArray, row: usize) -> Option<String> {
    (!array.is_null(row)).then(|| array.value(row).to_string())
}

fn embedding_at(batch: &RecordBatch, row: usize) -> AppResult<Vec<f32>> {
    let list = batch
        .column_by_name("embedding")
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| AppError::Index("Invalid embedding column".to_string()))?;

    let values = list.value(row);
    let floats = values
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| AppError::Index("Invalid embedding values".to_string()))?;

    Ok(floats.values().to_vec())
}

fn row_to_course(batch: &RecordBatch, row: usize) -> AppResult<CourseMetadata> {
    let lessons: Vec<LessonRef> =
        serde_json::from_str(string_column(batch, "lessons_json")?.value(row))?;

    Ok(CourseMetadata {
        title: string_column(batch, "title")?.value(row).to_string(),
        instructor: optional_string(string_column(batch, "instructor")?, row),
        course_link: optional_string(string_column(batch, "course_link")?, row),
        lessons,
    })
}

fn row_to_chunk(batch: &RecordBatch, row: usize) -> AppResult<ContentChunk> {
    let lessons = u32_column(batch, "lesson_number")?;

    Ok(ContentChunk {
        course_title: string_column(batch, "course_title")?.value(row).to_string(),
        lesson_number: (!lessons.is_null(row)).then(|| lessons.value(row)),
        chunk_index: u32_column(batch, "chunk_index")?.value(row),
        text: string_column(batch, "text")?.value(row).to_string(),
    })
}
