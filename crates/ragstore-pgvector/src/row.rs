use pgvector::Vector;
use ragstore_core::{Document, RagstoreError};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;

/// Column list shared by every SELECT over a document table, in the order the
/// table declares them.
pub(crate) const DOCUMENT_COLUMNS: &str = "id, collection, corpus_id, chunk_index, content, \
     title, metadata, origin_url, language, score, tags, embedding, created_at, updated_at, \
     is_deleted";

/// Map one row of a document table onto [`Document`].
pub(crate) fn document_from_row(row: &PgRow) -> Result<Document, RagstoreError> {
    let embedding: Option<Vector> = try_column(row, "embedding")?;
    let tags: Option<Json<Vec<String>>> = try_column(row, "tags")?;
    Ok(Document {
        id: try_column(row, "id")?,
        collection: try_column(row, "collection")?,
        corpus_id: try_column(row, "corpus_id")?,
        chunk_index: try_column(row, "chunk_index")?,
        content: try_column(row, "content")?,
        title: try_column(row, "title")?,
        metadata: try_column(row, "metadata")?,
        origin_url: try_column(row, "origin_url")?,
        language: try_column(row, "language")?,
        score: try_column(row, "score")?,
        tags: tags.map(|j| j.0).unwrap_or_default(),
        embedding: embedding.map(|v| v.to_vec()),
        created_at: try_column(row, "created_at")?,
        updated_at: try_column(row, "updated_at")?,
        is_deleted: try_column(row, "is_deleted")?,
    })
}

fn try_column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, RagstoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| RagstoreError::Database(format!("failed to decode column '{name}': {e}")))
}
