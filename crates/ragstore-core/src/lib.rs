//! Core types and traits for Ragstore.
//!
//! This crate defines the dependency-light vocabulary shared by every Ragstore
//! backend: the [`Document`] chunk model and its [`Corpus`] grouping, the
//! [`Embeddings`] provider trait, the [`SearchQuery`] / [`MetadataFilter`]
//! search structures, and the unified [`RagstoreError`] type.
//!
//! Glossary:
//! - a *corpus* is a full source text, identified by `corpus_id`;
//! - a *document* is one retrievable chunk (or the entirety) of a corpus,
//!   identified by `id` and ordered within the corpus by `chunk_index`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for Ragstore with variants covering all subsystems.
#[derive(Debug, Error)]
pub enum RagstoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("config error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One retrievable document chunk, as stored in a pgvector-backed table.
///
/// Every backend table carries this column set; downstream users pick the
/// table name and embedding dimensionality per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Primary key of the document row.
    pub id: Uuid,
    /// Collection name, used for filtering and grouping documents of the same type.
    pub collection: Option<String>,
    /// The corpus this chunk belongs to. `None` for standalone documents.
    pub corpus_id: Option<Uuid>,
    /// Index of this chunk within its corpus. Starts from 0.
    pub chunk_index: i32,
    /// String content of the chunk.
    pub content: String,
    /// Optional chunk title or summary.
    pub title: Option<String>,
    /// Flexible metadata, stored as JSONB.
    #[serde(default)]
    pub metadata: Value,
    /// Optional source URL.
    pub origin_url: Option<String>,
    /// Language of the content (ISO 639-1 code), e.g. "en", "es", "zh".
    pub language: String,
    /// Optional score assigned during ingestion (relevance, confidence).
    pub score: Option<f64>,
    /// Tags or keywords for filtering and faceted search, stored as a JSONB array.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Embedding vector. Dimensionality is fixed per table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Rows are logically marked for deletion before they are permanently removed.
    pub is_deleted: bool,
}

/// Optional per-document properties accepted by ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentProps {
    pub title: Option<String>,
    pub collection: Option<String>,
    pub origin_url: Option<String>,
    pub language: Option<String>,
    pub score: Option<f64>,
    pub tags: Option<Vec<String>>,
}

impl DocumentProps {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Document {
    /// Build a document row from ingestion properties.
    ///
    /// A fresh `id` is generated and both timestamps are stamped with the
    /// current time; `language` defaults to "en" unless overridden by `props`.
    pub fn from_props(
        corpus_id: Uuid,
        chunk_index: i32,
        content: impl Into<String>,
        embedding: Vec<f32>,
        metadata: Value,
        props: Option<DocumentProps>,
    ) -> Self {
        let props = props.unwrap_or_default();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            collection: props.collection,
            corpus_id: Some(corpus_id),
            chunk_index,
            content: content.into(),
            title: props.title,
            metadata,
            origin_url: props.origin_url,
            language: props.language.unwrap_or_else(|| "en".to_string()),
            score: props.score,
            tags: props.tags.unwrap_or_default(),
            embedding: Some(embedding),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }
}

/// A full corpus reconstructed from its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub corpus_id: Uuid,
    /// Chunk contents joined back together in chunk order.
    pub content: String,
    /// Metadata merged across chunks in chunk order (later chunks win).
    pub metadata: Value,
    /// The individual chunks, ordered by `chunk_index`.
    pub documents: Vec<Document>,
}

// ---------------------------------------------------------------------------
// Document metadata
// ---------------------------------------------------------------------------

/// Structured metadata attached to every document of a collection.
///
/// Implementations are plain serde structs; deriving [`JsonSchema`] in
/// addition lets [`validate_metadata_filter`] check search filters against the
/// schema before they reach the database.
pub trait DocumentMetadata: Serialize {
    /// Discriminator for the collection's document type.
    fn document_type(&self) -> &str;

    fn schema_version(&self) -> &str {
        "1.0"
    }

    fn to_value(&self) -> Result<Value, RagstoreError> {
        serde_json::to_value(self).map_err(|e| RagstoreError::Serialization(e.to_string()))
    }
}

/// Minimal metadata carrying only the type discriminator and schema version.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BasicMetadata {
    pub document_type: String,
    pub schema_version: String,
}

impl BasicMetadata {
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            schema_version: "1.0".to_string(),
        }
    }
}

impl DocumentMetadata for BasicMetadata {
    fn document_type(&self) -> &str {
        &self.document_type
    }

    fn schema_version(&self) -> &str {
        &self.schema_version
    }
}

// ---------------------------------------------------------------------------
// Embeddings trait (implemented by downstream providers and test fakes)
// ---------------------------------------------------------------------------

/// Trait for embedding text into vectors.
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Embed multiple texts (for batch document embedding).
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagstoreError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagstoreError>;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Search types
// ---------------------------------------------------------------------------

/// Comparison operator applied by a [`MetadataFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCondition {
    /// Equal.
    Eq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Array field contains the value.
    Contains,
    /// Field value is one of the given values.
    In,
    /// Field is present.
    Exists,
}

impl std::fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FilterCondition::Eq => "eq",
            FilterCondition::Gt => "gt",
            FilterCondition::Gte => "gte",
            FilterCondition::Lt => "lt",
            FilterCondition::Lte => "lte",
            FilterCondition::Contains => "contains",
            FilterCondition::In => "in",
            FilterCondition::Exists => "exists",
        };
        f.write_str(s)
    }
}

/// A single filter over the JSONB metadata column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Field path in metadata. Use dot notation for nested fields
    /// (e.g. "publication_info.journal").
    pub field_name: String,
    pub condition: FilterCondition,
    /// Value to compare against. Type should match the field type.
    pub value: Value,
}

impl MetadataFilter {
    pub fn new(
        field_name: impl Into<String>,
        condition: FilterCondition,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            condition,
            value: value.into(),
        }
    }
}

/// Standardized search query. At least one search criterion is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Text to match semantically, i.e. by vector distance.
    pub text: Option<String>,
    /// Keywords to substring-match against document content.
    pub keywords: Option<Vec<String>>,
    /// Metadata filters that must all hold.
    pub metadata_filters: Option<Vec<MetadataFilter>>,
    /// Restrict results by `created_at` (inclusive bounds).
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Maximum number of results to return. Must be at least 1.
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Query matching by vector similarity against `text`.
    pub fn semantic(text: impl Into<String>, limit: usize) -> Self {
        Self::new(limit).with_text(text)
    }

    /// Query matching documents whose content contains any of `keywords`.
    pub fn keyword(keywords: Vec<String>, limit: usize) -> Self {
        Self::new(limit).with_keywords(keywords)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn with_metadata_filters(mut self, filters: Vec<MetadataFilter>) -> Self {
        self.metadata_filters = Some(filters);
        self
    }

    pub fn with_date_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.date_range = Some((from, to));
        self
    }

    /// Check that the query is executable: a positive limit and at least one
    /// search criterion.
    pub fn validate(&self) -> Result<(), RagstoreError> {
        if self.limit == 0 {
            return Err(RagstoreError::Validation(
                "limit must be at least 1".to_string(),
            ));
        }
        let has_criterion = self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
            || self.keywords.as_ref().is_some_and(|k| !k.is_empty())
            || self
                .metadata_filters
                .as_ref()
                .is_some_and(|f| !f.is_empty())
            || self.date_range.is_some();
        if !has_criterion {
            return Err(RagstoreError::Validation(
                "at least one search criterion is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Standardized result structure for all retrieval operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub document: Document,
    /// Cosine similarity when the query had semantic text, 0.0 otherwise.
    pub score: f32,
}

// ---------------------------------------------------------------------------
// Metadata filter validation
// ---------------------------------------------------------------------------

/// Validate a metadata filter against the JSON schema of a metadata type.
///
/// Checks that `field_name` resolves through the schema (navigating nested
/// objects via dot notation) and that the condition is compatible with the
/// field's type. Errors before any SQL is built, mirroring what a typed ORM
/// layer would reject at query construction.
pub fn validate_metadata_filter<M: JsonSchema>(
    filter: &MetadataFilter,
) -> Result<(), RagstoreError> {
    let schema = schemars::schema_for!(M);
    validate_filter_against_schema(filter, schema.as_value())
}

/// Schema-value form of [`validate_metadata_filter`], for callers that already
/// hold a generated schema.
pub fn validate_filter_against_schema(
    filter: &MetadataFilter,
    root: &Value,
) -> Result<(), RagstoreError> {
    let segments: Vec<&str> = filter.field_name.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(RagstoreError::Validation(format!(
            "invalid field path '{}'",
            filter.field_name
        )));
    }

    let mut node = root;
    for (i, part) in segments.iter().enumerate() {
        let resolved = resolve_ref(node, root)?;
        let prop = resolved
            .get("properties")
            .and_then(|p| p.get(*part))
            .ok_or_else(|| {
                RagstoreError::Validation(format!(
                    "field '{}' not found in metadata schema",
                    filter.field_name
                ))
            })?;
        node = prop;
        if i < segments.len() - 1 {
            let next = resolve_ref(node, root)?;
            if next.get("properties").is_none() {
                return Err(RagstoreError::Validation(format!(
                    "cannot navigate into non-object field '{}' in path '{}'",
                    part, filter.field_name
                )));
            }
        }
    }

    let leaf = resolve_ref(node, root)?;
    validate_condition_compatibility(schema_type(leaf), filter.condition, &filter.field_name)
}

/// Follow a `$ref` into the root schema's `$defs`, if present.
fn resolve_ref<'a>(node: &'a Value, root: &'a Value) -> Result<&'a Value, RagstoreError> {
    let Some(reference) = node.get("$ref").and_then(Value::as_str) else {
        return Ok(node);
    };
    let name = reference.strip_prefix("#/$defs/").ok_or_else(|| {
        RagstoreError::Validation(format!("unsupported schema reference '{reference}'"))
    })?;
    root.get("$defs")
        .and_then(|d| d.get(name))
        .ok_or_else(|| RagstoreError::Validation(format!("unresolved schema reference '{reference}'")))
}

/// Extract the first non-"null" instance type of a schema node, if any.
fn schema_type(node: &Value) -> Option<&str> {
    match node.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

fn validate_condition_compatibility(
    field_type: Option<&str>,
    condition: FilterCondition,
    field_name: &str,
) -> Result<(), RagstoreError> {
    use FilterCondition::*;
    let allowed: &[FilterCondition] = match field_type {
        Some("string") => &[Eq, Exists],
        Some("integer") | Some("number") => &[Eq, Gt, Gte, Lt, Lte, Exists],
        Some("boolean") => &[Eq, Exists],
        Some("array") => &[Contains, In, Exists],
        _ => &[Eq, Exists],
    };
    if !allowed.contains(&condition) {
        return Err(RagstoreError::Validation(format!(
            "condition '{condition}' not valid for field '{field_name}' of type {}",
            field_type.unwrap_or("unknown")
        )));
    }
    Ok(())
}
