use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use ragstore_core::RagstoreError;

use crate::table::{validate_identifier, DocumentTableConfig};

/// Connection settings for [`DatabaseManager`].
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// PostgreSQL connection string.
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Read settings from the environment: `RAGSTORE_DATABASE_URL`, falling
    /// back to `DATABASE_URL`.
    pub fn from_env() -> Result<Self, RagstoreError> {
        let url = std::env::var("RAGSTORE_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| {
                RagstoreError::Config(
                    "neither RAGSTORE_DATABASE_URL nor DATABASE_URL is set".to_string(),
                )
            })?;
        Ok(Self::new(url))
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// Manages the connection pool and schema/table setup for a pgvector database.
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Connect to the database and ensure the pgvector extension is installed.
    ///
    /// Connections are health-checked before reuse and recycled after five
    /// minutes.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, RagstoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .test_before_acquire(true)
            .max_lifetime(Duration::from_secs(300))
            .connect(&settings.database_url)
            .await
            .map_err(|e| RagstoreError::Database(format!("failed to connect: {e}")))?;

        let manager = Self { pool };
        manager.ensure_pgvector_extension().await?;
        Ok(manager)
    }

    /// Wrap an existing pool. The pgvector extension is assumed to be present.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ensure the pgvector extension is available (idempotent).
    pub async fn ensure_pgvector_extension(&self) -> Result<(), RagstoreError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                RagstoreError::Database(format!("failed to create pgvector extension: {e}"))
            })?;
        debug!("pgvector extension ensured");
        Ok(())
    }

    /// Create a schema for a collection type (idempotent).
    pub async fn create_schema(&self, schema_name: &str) -> Result<(), RagstoreError> {
        validate_identifier(schema_name)?;
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {schema_name}");
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| RagstoreError::Database(format!("failed to create schema: {e}")))?;
        info!(schema = schema_name, "created schema");
        Ok(())
    }

    /// Create the document tables and their indexes (idempotent).
    pub async fn create_tables(
        &self,
        tables: &[DocumentTableConfig],
    ) -> Result<(), RagstoreError> {
        for table in tables {
            table.validate()?;
            sqlx::query(&table.create_table_sql())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    RagstoreError::Database(format!(
                        "failed to create table {}: {e}",
                        table.qualified_name()
                    ))
                })?;
            for index_sql in table.create_index_sql() {
                sqlx::query(&index_sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        RagstoreError::Database(format!(
                            "failed to create index on {}: {e}",
                            table.qualified_name()
                        ))
                    })?;
            }
            info!(table = %table.qualified_name(), "created document table");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults() {
        let settings = DatabaseSettings::new("postgres://localhost/test");
        assert_eq!(settings.max_connections, 5);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn settings_override() {
        let settings = DatabaseSettings::new("postgres://localhost/test").with_max_connections(2);
        assert_eq!(settings.max_connections, 2);
    }
}
