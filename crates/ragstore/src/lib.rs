//! Ragstore — a template library for flexible PostgreSQL + pgvector RAG
//! implementations.
//!
//! This crate re-exports the Ragstore sub-crates for convenient single-import
//! usage.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `pgvector` |
//! | `pgvector` | PostgreSQL + pgvector backend (`DatabaseManager`, `CorpusManager`, `SearchClient`, `DocumentService`) |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ragstore::core::{Embeddings, SearchQuery};
//! use ragstore::pgvector::{DatabaseManager, DocumentService, DocumentTableConfig};
//! ```

/// Core types and traits: Document, Corpus, Embeddings, SearchQuery,
/// MetadataFilter, RagstoreError. Always available.
pub use ragstore_core as core;

/// PostgreSQL + pgvector backend.
#[cfg(feature = "pgvector")]
pub use ragstore_pgvector as pgvector;

// Flat re-exports of the everyday types.
pub use ragstore_core::{
    Corpus, Document, DocumentMetadata, DocumentProps, Embeddings, FilterCondition,
    MetadataFilter, RagstoreError, RetrievalResult, SearchQuery,
};

#[cfg(feature = "pgvector")]
pub use ragstore_pgvector::{
    CorpusManager, DatabaseManager, DatabaseSettings, DocumentService, DocumentServiceConfig,
    DocumentTableConfig, SearchClient, SearchClientConfig, TempSchemaManager,
};
