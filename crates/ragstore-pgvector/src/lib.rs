//! PostgreSQL + pgvector backend for Ragstore.
//!
//! This crate implements the Ragstore document store on top of PostgreSQL with
//! the [pgvector](https://github.com/pgvector/pgvector) extension. Document
//! content, structured metadata (as JSONB), and embedding vectors live in one
//! table per collection, using cosine distance (`<=>`) for similarity search.
//!
//! The main entry points are:
//! - [`DatabaseManager`] — connection pool and schema/table setup;
//! - [`CorpusManager`] / [`PgCorpusManager`] — corpus ingestion (chunk, embed,
//!   insert) and reconstruction;
//! - [`SearchClient`] — semantic, keyword, metadata-filter, and date-range
//!   search over one table;
//! - [`DocumentService`] — a corpus manager and a search client bundled behind
//!   a single configuration;
//! - [`TempSchemaManager`] — disposable schemas for integration tests.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ragstore_pgvector::{
//!     CorpusManager, DatabaseManager, DatabaseSettings, DocumentService,
//!     DocumentServiceConfig, DocumentTableConfig,
//! };
//! # async fn example(embeddings: Arc<dyn ragstore_core::Embeddings>) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = DatabaseSettings::from_env()?;
//! let db = DatabaseManager::connect(&settings).await?;
//!
//! let table = DocumentTableConfig::new("articles", 1024);
//! db.create_tables(std::slice::from_ref(&table)).await?;
//!
//! let service = DocumentService::new(
//!     db.pool().clone(),
//!     DocumentServiceConfig::new(table, embeddings),
//! );
//! let (corpus_id, chunks) = service
//!     .corpus_manager()
//!     .insert_corpus("first paragraph\n\nsecond paragraph", serde_json::json!({}), None)
//!     .await?;
//! # let _ = (corpus_id, chunks);
//! # Ok(())
//! # }
//! ```

mod connection;
mod corpus;
mod row;
mod search;
mod service;
mod table;
mod temp;

pub use connection::{DatabaseManager, DatabaseSettings};
pub use corpus::{CorpusManager, CorpusManagerConfig, PgCorpusManager};
pub use search::{SearchClient, SearchClientConfig};
pub use service::{DocumentService, DocumentServiceConfig};
pub use table::DocumentTableConfig;
pub use temp::TempSchemaManager;

// Re-export core types for convenience.
pub use ragstore_core::{
    Corpus, Document, DocumentProps, Embeddings, FilterCondition, MetadataFilter, RagstoreError,
    RetrievalResult, SearchQuery,
};
