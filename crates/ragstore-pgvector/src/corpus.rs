use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use pgvector::Vector;
use ragstore_core::{Corpus, Document, DocumentProps, Embeddings, RagstoreError};

use crate::row::{document_from_row, DOCUMENT_COLUMNS};
use crate::table::DocumentTableConfig;

/// Configuration for a corpus manager.
#[derive(Clone)]
pub struct CorpusManagerConfig {
    pub table: DocumentTableConfig,
    /// Embedding provider used during ingestion. Required for
    /// [`CorpusManager::insert_corpus`].
    pub embeddings: Option<Arc<dyn Embeddings>>,
    /// Delimiter used to split corpora into chunks and to join them back.
    pub chunk_delimiter: String,
}

impl CorpusManagerConfig {
    pub fn new(table: DocumentTableConfig) -> Self {
        Self {
            table,
            embeddings: None,
            chunk_delimiter: "\n\n".to_string(),
        }
    }

    pub fn with_embeddings(mut self, embeddings: Arc<dyn Embeddings>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn with_chunk_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.chunk_delimiter = delimiter.into();
        self
    }
}

/// Corpus management operations over one document table.
///
/// The trait ships default implementations for the whole ingestion and
/// reconstruction flow; implementors supply the pool and configuration, and
/// can override the chunking template methods ([`split_corpus`]
/// (CorpusManager::split_corpus), [`chunk_metadata`]
/// (CorpusManager::chunk_metadata), [`join_chunks`](CorpusManager::join_chunks))
/// for collection-specific behavior.
#[async_trait]
pub trait CorpusManager: Send + Sync {
    fn pool(&self) -> &PgPool;

    fn config(&self) -> &CorpusManagerConfig;

    /// Split a corpus into chunks. The default splits on the configured
    /// delimiter, trims, and drops empty chunks.
    fn split_corpus(&self, content: &str) -> Vec<String> {
        content
            .split(self.config().chunk_delimiter.as_str())
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(String::from)
            .collect()
    }

    /// Per-chunk metadata merged into the corpus metadata on insert.
    fn chunk_metadata(&self, content: &str) -> Value {
        json!({ "chunk_length": content.chars().count() })
    }

    /// Join chunks back into the full corpus content and merged metadata.
    ///
    /// Metadata objects are merged in chunk order, later chunks winning on
    /// key conflicts.
    fn join_chunks(&self, documents: &[Document]) -> (String, Value) {
        let content = documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(self.config().chunk_delimiter.as_str());

        let mut merged = Map::new();
        for document in documents {
            if let Value::Object(map) = &document.metadata {
                for (key, value) in map {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        (content, Value::Object(merged))
    }

    /// Split a corpus, embed its chunks, and insert them as one new corpus.
    ///
    /// Returns the generated corpus id and the number of chunks inserted
    /// (zero when the content produced no chunks).
    async fn insert_corpus(
        &self,
        content: &str,
        corpus_metadata: Value,
        props: Option<DocumentProps>,
    ) -> Result<(Uuid, usize), RagstoreError> {
        let provider = self.config().embeddings.clone().ok_or_else(|| {
            RagstoreError::Embedding("corpus manager has no embeddings provider".to_string())
        })?;

        let corpus_id = Uuid::new_v4();
        let chunks = self.split_corpus(content);
        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = provider.embed_documents(&texts).await?;

        let inserted = self
            .insert_documents(corpus_id, &chunks, embeddings, corpus_metadata, props)
            .await?;
        Ok((corpus_id, inserted))
    }

    /// Insert pre-chunked, pre-embedded documents as chunks of `corpus_id`.
    ///
    /// All rows are written in one transaction. Each chunk's metadata is the
    /// corpus metadata merged with [`chunk_metadata`]
    /// (CorpusManager::chunk_metadata).
    async fn insert_documents(
        &self,
        corpus_id: Uuid,
        contents: &[String],
        embeddings: Vec<Vec<f32>>,
        corpus_metadata: Value,
        props: Option<DocumentProps>,
    ) -> Result<usize, RagstoreError> {
        if contents.len() != embeddings.len() {
            return Err(RagstoreError::Validation(format!(
                "number of embeddings ({}) does not match number of documents ({})",
                embeddings.len(),
                contents.len()
            )));
        }
        if contents.is_empty() {
            return Ok(0);
        }
        self.config().table.validate()?;

        let documents: Vec<Document> = contents
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| {
                let metadata = merge_metadata(&corpus_metadata, self.chunk_metadata(content));
                Document::from_props(
                    corpus_id,
                    index as i32,
                    content.clone(),
                    embedding,
                    metadata,
                    props.clone(),
                )
            })
            .collect();

        let insert_sql = format!(
            "INSERT INTO {table} ({DOCUMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            table = self.config().table.qualified_name(),
        );

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| RagstoreError::Database(format!("failed to begin transaction: {e}")))?;

        for document in &documents {
            let embedding = document.embedding.clone().map(Vector::from);
            sqlx::query(&insert_sql)
                .bind(document.id)
                .bind(&document.collection)
                .bind(document.corpus_id)
                .bind(document.chunk_index)
                .bind(&document.content)
                .bind(&document.title)
                .bind(&document.metadata)
                .bind(&document.origin_url)
                .bind(&document.language)
                .bind(document.score)
                .bind(sqlx::types::Json(&document.tags))
                .bind(embedding)
                .bind(document.created_at)
                .bind(document.updated_at)
                .bind(document.is_deleted)
                .execute(&mut *tx)
                .await
                .map_err(|e| RagstoreError::Database(format!("insert failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| RagstoreError::Database(format!("commit failed: {e}")))?;

        debug!(corpus_id = %corpus_id, chunks = documents.len(), "inserted corpus");
        Ok(documents.len())
    }

    /// Reconstruct a full corpus from its non-deleted chunks, ordered by
    /// `chunk_index`. Returns `None` when the corpus has no chunks.
    async fn get_full_corpus(&self, corpus_id: Uuid) -> Result<Option<Corpus>, RagstoreError> {
        self.config().table.validate()?;
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM {table} \
             WHERE corpus_id = $1 AND is_deleted = FALSE \
             ORDER BY chunk_index",
            table = self.config().table.qualified_name(),
        );

        let rows = sqlx::query(&sql)
            .bind(corpus_id)
            .fetch_all(self.pool())
            .await
            .map_err(|e| RagstoreError::Database(format!("corpus query failed: {e}")))?;
        if rows.is_empty() {
            return Ok(None);
        }

        let documents = rows
            .iter()
            .map(document_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let (content, metadata) = self.join_chunks(&documents);
        Ok(Some(Corpus {
            corpus_id,
            content,
            metadata,
            documents,
        }))
    }

    /// Logically delete all chunks of a corpus. Returns the number of rows
    /// marked.
    async fn soft_delete_corpus(&self, corpus_id: Uuid) -> Result<u64, RagstoreError> {
        self.config().table.validate()?;
        let sql = format!(
            "UPDATE {table} SET is_deleted = TRUE, updated_at = now() \
             WHERE corpus_id = $1 AND is_deleted = FALSE",
            table = self.config().table.qualified_name(),
        );
        let result = sqlx::query(&sql)
            .bind(corpus_id)
            .execute(self.pool())
            .await
            .map_err(|e| RagstoreError::Database(format!("soft delete failed: {e}")))?;
        Ok(result.rows_affected())
    }

    /// Permanently delete all chunks of a corpus, deleted or not. Returns the
    /// number of rows removed.
    async fn purge_corpus(&self, corpus_id: Uuid) -> Result<u64, RagstoreError> {
        self.config().table.validate()?;
        let sql = format!(
            "DELETE FROM {table} WHERE corpus_id = $1",
            table = self.config().table.qualified_name(),
        );
        let result = sqlx::query(&sql)
            .bind(corpus_id)
            .execute(self.pool())
            .await
            .map_err(|e| RagstoreError::Database(format!("delete failed: {e}")))?;
        Ok(result.rows_affected())
    }
}

/// The stock corpus manager: default behavior over a connection pool.
pub struct PgCorpusManager {
    pool: PgPool,
    config: CorpusManagerConfig,
}

impl PgCorpusManager {
    pub fn new(pool: PgPool, config: CorpusManagerConfig) -> Self {
        Self { pool, config }
    }
}

impl CorpusManager for PgCorpusManager {
    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn config(&self) -> &CorpusManagerConfig {
        &self.config
    }
}

/// Shallow merge of two metadata objects; `overlay` wins on key conflicts.
fn merge_metadata(base: &Value, overlay: Value) -> Value {
    let mut merged = match base {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    if let Value::Object(map) = overlay {
        for (key, value) in map {
            merged.insert(key, value);
        }
    }
    Value::Object(merged)
}
