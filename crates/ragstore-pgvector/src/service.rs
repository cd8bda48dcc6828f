use std::sync::Arc;

use sqlx::PgPool;

use ragstore_core::Embeddings;

use crate::corpus::{CorpusManager, CorpusManagerConfig, PgCorpusManager};
use crate::search::{SearchClient, SearchClientConfig};
use crate::table::DocumentTableConfig;

/// Configuration for a [`DocumentService`].
#[derive(Clone)]
pub struct DocumentServiceConfig {
    pub table: DocumentTableConfig,
    pub embeddings: Arc<dyn Embeddings>,
    /// Chunk delimiter override for the corpus manager.
    pub chunk_delimiter: Option<String>,
}

impl DocumentServiceConfig {
    pub fn new(table: DocumentTableConfig, embeddings: Arc<dyn Embeddings>) -> Self {
        Self {
            table,
            embeddings,
            chunk_delimiter: None,
        }
    }

    pub fn with_chunk_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.chunk_delimiter = Some(delimiter.into());
        self
    }
}

/// Service layer combining corpus management and search over one table.
///
/// This is the template's highest-level entry point: one configuration yields
/// an ingestion side ([`CorpusManager`]) and a retrieval side
/// ([`SearchClient`]) sharing the same table and embeddings provider.
pub struct DocumentService {
    corpus_manager: Box<dyn CorpusManager>,
    search_client: SearchClient,
}

impl DocumentService {
    pub fn new(pool: PgPool, config: DocumentServiceConfig) -> Self {
        let mut manager_config = CorpusManagerConfig::new(config.table.clone())
            .with_embeddings(config.embeddings.clone());
        if let Some(delimiter) = config.chunk_delimiter {
            manager_config = manager_config.with_chunk_delimiter(delimiter);
        }
        let corpus_manager = Box::new(PgCorpusManager::new(pool.clone(), manager_config));
        let search_client = SearchClient::new(
            pool,
            SearchClientConfig::new(config.table).with_embeddings(config.embeddings),
        );
        Self {
            corpus_manager,
            search_client,
        }
    }

    /// Assemble a service from custom parts, e.g. a corpus manager with
    /// collection-specific chunking.
    pub fn with_parts(corpus_manager: Box<dyn CorpusManager>, search_client: SearchClient) -> Self {
        Self {
            corpus_manager,
            search_client,
        }
    }

    pub fn corpus_manager(&self) -> &dyn CorpusManager {
        self.corpus_manager.as_ref()
    }

    pub fn search_client(&self) -> &SearchClient {
        &self.search_client
    }
}
