use ragstore_core::RagstoreError;

/// Configuration for one pgvector-backed document table.
///
/// A table holds one collection of documents with a fixed embedding
/// dimensionality. The column set is the same for every table; downstream
/// users choose the table name, schema, and dimensions per collection.
#[derive(Debug, Clone)]
pub struct DocumentTableConfig {
    /// PostgreSQL schema the table lives in. `None` means the default schema.
    pub schema: Option<String>,
    /// Name of the table used to store documents and embeddings.
    pub table_name: String,
    /// Dimensionality of the embedding vectors (e.g. 1024 or 1536).
    pub vector_dimensions: u32,
}

impl DocumentTableConfig {
    /// Create a new table configuration.
    ///
    /// # Panics
    ///
    /// Panics if `table_name` is empty or `vector_dimensions` is zero.
    pub fn new(table_name: impl Into<String>, vector_dimensions: u32) -> Self {
        let table_name = table_name.into();
        assert!(!table_name.is_empty(), "table_name must not be empty");
        assert!(vector_dimensions > 0, "vector_dimensions must be > 0");
        Self {
            schema: None,
            table_name,
            vector_dimensions,
        }
    }

    /// Place the table in a named schema.
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// The schema-qualified table name, as interpolated into SQL.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.table_name),
            None => self.table_name.clone(),
        }
    }

    /// Check that the table and schema names are safe to interpolate into SQL.
    pub fn validate(&self) -> Result<(), RagstoreError> {
        validate_identifier(&self.table_name)?;
        if let Some(schema) = &self.schema {
            validate_identifier(schema)?;
        }
        Ok(())
    }

    /// DDL creating the document table (idempotent).
    pub fn create_table_sql(&self) -> String {
        format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
                id UUID PRIMARY KEY,
                collection VARCHAR(64),
                corpus_id UUID,
                chunk_index INTEGER NOT NULL DEFAULT 0,
                content TEXT NOT NULL,
                title VARCHAR(500),
                metadata JSONB NOT NULL DEFAULT '{{}}',
                origin_url VARCHAR(2048),
                language VARCHAR(10) NOT NULL DEFAULT 'en',
                score DOUBLE PRECISION,
                tags JSONB NOT NULL DEFAULT '[]',
                embedding vector({dims}),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE
            )"#,
            table = self.qualified_name(),
            dims = self.vector_dimensions,
        )
    }

    /// DDL creating the supporting indexes (idempotent).
    ///
    /// Corpus reconstruction reads `(corpus_id, chunk_index)`; metadata
    /// filters hit the JSONB column through a GIN index.
    pub fn create_index_sql(&self) -> Vec<String> {
        let table = self.qualified_name();
        let name = &self.table_name;
        vec![
            format!(
                "CREATE INDEX IF NOT EXISTS ix_{name}_corpus_chunk ON {table} (corpus_id, chunk_index)"
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS ix_{name}_metadata_gin ON {table} USING GIN (metadata)"
            ),
        ]
    }
}

/// Validate that a name is safe to interpolate into SQL as an identifier.
///
/// Allows alphanumeric ASCII characters and underscores only.
pub(crate) fn validate_identifier(name: &str) -> Result<(), RagstoreError> {
    if name.is_empty() {
        return Err(RagstoreError::Schema(
            "identifier must not be empty".to_string(),
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RagstoreError::Schema(format!(
            "invalid identifier '{name}': only alphanumeric and underscore characters are allowed",
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_construction() {
        let config = DocumentTableConfig::new("articles", 1024);
        assert_eq!(config.table_name, "articles");
        assert_eq!(config.vector_dimensions, 1024);
        assert_eq!(config.qualified_name(), "articles");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "table_name must not be empty")]
    fn config_rejects_empty_table_name() {
        DocumentTableConfig::new("", 1024);
    }

    #[test]
    #[should_panic(expected = "vector_dimensions must be > 0")]
    fn config_rejects_zero_dimensions() {
        DocumentTableConfig::new("articles", 0);
    }

    #[test]
    fn schema_qualification() {
        let config = DocumentTableConfig::new("articles", 8).in_schema("tenant_a");
        assert_eq!(config.qualified_name(), "tenant_a.articles");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_sql_injection() {
        assert!(validate_identifier("docs; DROP TABLE users").is_err());
        assert!(validate_identifier("docs--comment").is_err());
        assert!(validate_identifier("docs'malicious").is_err());
        assert!(validate_identifier("").is_err());

        let config = DocumentTableConfig::new("articles", 8).in_schema("bad schema");
        assert!(config.validate().is_err());
    }

    #[test]
    fn create_table_sql_has_full_column_set() {
        let sql = DocumentTableConfig::new("articles", 1024).create_table_sql();
        for column in [
            "id UUID PRIMARY KEY",
            "corpus_id UUID",
            "chunk_index INTEGER",
            "content TEXT NOT NULL",
            "metadata JSONB NOT NULL",
            "embedding vector(1024)",
            "is_deleted BOOLEAN",
        ] {
            assert!(sql.contains(column), "missing '{column}' in DDL:\n{sql}");
        }
    }

    #[test]
    fn index_sql_targets_qualified_table() {
        let config = DocumentTableConfig::new("articles", 8).in_schema("tenant_a");
        let statements = config.create_index_sql();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("ON tenant_a.articles (corpus_id, chunk_index)"));
        assert!(statements[1].contains("USING GIN (metadata)"));
    }
}
