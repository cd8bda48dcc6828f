use std::sync::Arc;

use pgvector::Vector;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

use ragstore_core::{
    Embeddings, FilterCondition, MetadataFilter, RagstoreError, RetrievalResult, SearchQuery,
};

use crate::row::{document_from_row, DOCUMENT_COLUMNS};
use crate::table::{validate_identifier, DocumentTableConfig};

/// Configuration for a [`SearchClient`].
#[derive(Clone)]
pub struct SearchClientConfig {
    pub table: DocumentTableConfig,
    /// Embedding provider, required only for semantic (text) queries.
    pub embeddings: Option<Arc<dyn Embeddings>>,
}

impl SearchClientConfig {
    pub fn new(table: DocumentTableConfig) -> Self {
        Self {
            table,
            embeddings: None,
        }
    }

    pub fn with_embeddings(mut self, embeddings: Arc<dyn Embeddings>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }
}

/// Executes [`SearchQuery`] requests against one document table.
///
/// All criteria of a query are combined into a single SQL statement: vector
/// ordering by cosine distance, ILIKE keyword matching, JSONB metadata
/// filters, and a `created_at` range. Soft-deleted rows are never returned.
pub struct SearchClient {
    pool: PgPool,
    config: SearchClientConfig,
}

impl SearchClient {
    pub fn new(pool: PgPool, config: SearchClientConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &SearchClientConfig {
        &self.config
    }

    /// Main search interface.
    ///
    /// The query is validated first; a query with semantic text requires an
    /// embeddings provider. Scores are cosine similarity for semantic
    /// queries and 0.0 otherwise.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<RetrievalResult>, RagstoreError> {
        query.validate()?;
        self.config.table.validate()?;

        let query_vector = match query.text.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                let provider = self.config.embeddings.as_ref().ok_or_else(|| {
                    RagstoreError::Embedding(
                        "semantic search requires an embeddings provider".to_string(),
                    )
                })?;
                Some(Vector::from(provider.embed_query(text).await?))
            }
            _ => None,
        };

        let mut builder = build_search_sql(&self.config.table, query, query_vector)?;
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RagstoreError::Database(format!("search failed: {e}")))?;

        let results = rows
            .iter()
            .map(|row| {
                let similarity: Option<f64> = row
                    .try_get("similarity")
                    .map_err(|e| RagstoreError::Database(format!("missing similarity: {e}")))?;
                Ok(RetrievalResult {
                    document: document_from_row(row)?,
                    score: similarity.unwrap_or(0.0) as f32,
                })
            })
            .collect::<Result<Vec<_>, RagstoreError>>()?;

        debug!(results = results.len(), limit = query.limit, "search executed");
        Ok(results)
    }

    /// Vector similarity search. Blank text returns no results without
    /// touching the database.
    pub async fn similarity_search(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<RetrievalResult>, RagstoreError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.search(&SearchQuery::semantic(text, limit)).await
    }

    /// Substring keyword search over document content.
    pub async fn keyword_search(
        &self,
        keywords: Vec<String>,
        limit: usize,
    ) -> Result<Vec<RetrievalResult>, RagstoreError> {
        self.search(&SearchQuery::keyword(keywords, limit)).await
    }
}

/// Build the complete search statement for one query.
///
/// `query_vector` carries the embedded semantic text, when present; it drives
/// both the similarity column and the ordering.
fn build_search_sql(
    table: &DocumentTableConfig,
    query: &SearchQuery,
    query_vector: Option<Vector>,
) -> Result<QueryBuilder<'static, Postgres>, RagstoreError> {
    let mut builder: QueryBuilder<'static, Postgres> =
        QueryBuilder::new(format!("SELECT {DOCUMENT_COLUMNS}, "));

    match &query_vector {
        Some(vector) => {
            builder.push("1 - (embedding <=> ");
            builder.push_bind(vector.clone());
            builder.push(") AS similarity");
        }
        None => {
            builder.push("0.0::float8 AS similarity");
        }
    }

    builder.push(format!(" FROM {}", table.qualified_name()));
    builder.push(" WHERE is_deleted = FALSE");

    if let Some(keywords) = query.keywords.as_ref().filter(|k| !k.is_empty()) {
        builder.push(" AND (");
        for (i, keyword) in keywords.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push("content ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(keyword)));
        }
        builder.push(")");
    }

    if let Some(filters) = &query.metadata_filters {
        for filter in filters {
            builder.push(" AND ");
            push_metadata_filter(&mut builder, filter)?;
        }
    }

    if let Some((from, to)) = query.date_range {
        builder.push(" AND created_at >= ");
        builder.push_bind(from);
        builder.push(" AND created_at <= ");
        builder.push_bind(to);
    }

    match query_vector {
        Some(vector) => {
            builder.push(" ORDER BY embedding <=> ");
            builder.push_bind(vector);
        }
        None => {
            builder.push(" ORDER BY created_at DESC, chunk_index");
        }
    }

    builder.push(" LIMIT ");
    builder.push_bind(query.limit as i64);

    Ok(builder)
}

/// Append one metadata filter as a SQL condition.
///
/// Field paths use dot notation into the JSONB `metadata` column; every path
/// segment is identifier-validated before interpolation.
fn push_metadata_filter(
    builder: &mut QueryBuilder<'static, Postgres>,
    filter: &MetadataFilter,
) -> Result<(), RagstoreError> {
    let segments: Vec<&str> = filter.field_name.split('.').collect();
    for segment in &segments {
        validate_identifier(segment).map_err(|_| {
            RagstoreError::Query(format!(
                "invalid metadata field path '{}'",
                filter.field_name
            ))
        })?;
    }

    let text_path = jsonb_path(&segments, true);
    let json_path = jsonb_path(&segments, false);

    match filter.condition {
        FilterCondition::Eq => match &filter.value {
            serde_json::Value::String(s) => {
                builder.push(format!("{text_path} = "));
                builder.push_bind(s.clone());
            }
            other => {
                builder.push(format!("{json_path} = "));
                builder.push_bind(other.clone());
            }
        },
        FilterCondition::Gt | FilterCondition::Gte | FilterCondition::Lt | FilterCondition::Lte => {
            let op = match filter.condition {
                FilterCondition::Gt => ">",
                FilterCondition::Gte => ">=",
                FilterCondition::Lt => "<",
                _ => "<=",
            };
            match &filter.value {
                serde_json::Value::Number(n) => {
                    let value = n.as_f64().ok_or_else(|| {
                        RagstoreError::Query(format!(
                            "non-finite number in filter on '{}'",
                            filter.field_name
                        ))
                    })?;
                    builder.push(format!("({text_path})::float8 {op} "));
                    builder.push_bind(value);
                }
                serde_json::Value::String(s) => {
                    builder.push(format!("{text_path} {op} "));
                    builder.push_bind(s.clone());
                }
                _ => {
                    return Err(RagstoreError::Query(format!(
                        "condition '{}' requires a number or string value",
                        filter.condition
                    )));
                }
            }
        }
        FilterCondition::Contains => {
            builder.push(format!("{json_path} @> "));
            builder.push_bind(filter.value.clone());
        }
        FilterCondition::In => {
            let values = match &filter.value {
                serde_json::Value::Array(items) => items.iter().map(stringify).collect(),
                single => vec![stringify(single)],
            };
            builder.push(format!("{text_path} = ANY("));
            builder.push_bind(values);
            builder.push(")");
        }
        FilterCondition::Exists => {
            let Some((leaf, parents)) = segments.split_last() else {
                return Err(RagstoreError::Query(format!(
                    "invalid metadata field path '{}'",
                    filter.field_name
                )));
            };
            if parents.is_empty() {
                builder.push("metadata ? ");
            } else {
                builder.push(format!("{} ? ", jsonb_path(parents, false)));
            }
            builder.push_bind(leaf.to_string());
        }
    }
    Ok(())
}

/// JSONB accessor for a validated dot path. `as_text` selects `->>`/`#>>`
/// (text extraction) over `->`/`#>` (JSONB extraction).
fn jsonb_path(segments: &[&str], as_text: bool) -> String {
    if segments.len() == 1 {
        let op = if as_text { "->>" } else { "->" };
        format!("metadata {op} '{}'", segments[0])
    } else {
        let op = if as_text { "#>>" } else { "#>" };
        format!("metadata {op} '{{{}}}'", segments.join(","))
    }
}

/// Stringify a JSON value the way Postgres `->>` renders it.
fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape ILIKE wildcard characters in user-supplied keywords.
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
