use ragstore_core::RagstoreError;
use uuid::Uuid;

use crate::connection::DatabaseManager;
use crate::table::{validate_identifier, DocumentTableConfig};

/// Creates and tears down disposable schemas for integration tests.
///
/// Each call to [`setup`](TempSchemaManager::setup) creates a uniquely named
/// schema (`temp_{suffix}_{random}`) holding all configured document tables,
/// so parallel test runs never collide. [`cleanup`](TempSchemaManager::cleanup)
/// drops the whole schema with CASCADE.
pub struct TempSchemaManager {
    db: DatabaseManager,
    schema_suffix: String,
    tables: Vec<DocumentTableConfig>,
}

impl TempSchemaManager {
    pub fn new(
        db: DatabaseManager,
        schema_suffix: impl Into<String>,
        tables: Vec<DocumentTableConfig>,
    ) -> Result<Self, RagstoreError> {
        let schema_suffix = schema_suffix.into();
        validate_identifier(&schema_suffix)?;
        Ok(Self {
            db,
            schema_suffix,
            tables,
        })
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }

    /// Create a fresh temporary schema with all configured tables and return
    /// its name.
    pub async fn setup(&self) -> Result<String, RagstoreError> {
        let schema = self.generate_schema_name();
        self.db.create_schema(&schema).await?;
        let tables: Vec<DocumentTableConfig> = self
            .tables
            .iter()
            .map(|t| t.clone().in_schema(schema.clone()))
            .collect();
        self.db.create_tables(&tables).await?;
        Ok(schema)
    }

    /// Drop a temporary schema and everything in it.
    ///
    /// Refuses to drop schemas that were not created by this manager (the
    /// `temp_` prefix is the marker).
    pub async fn cleanup(&self, schema: &str) -> Result<(), RagstoreError> {
        validate_identifier(schema)?;
        if !schema.starts_with("temp_") {
            return Err(RagstoreError::Schema(format!(
                "refusing to drop non-temporary schema '{schema}'"
            )));
        }
        let sql = format!("DROP SCHEMA IF EXISTS {schema} CASCADE");
        sqlx::query(&sql)
            .execute(self.db.pool())
            .await
            .map_err(|e| RagstoreError::Database(format!("failed to drop schema: {e}")))?;
        Ok(())
    }

    fn generate_schema_name(&self) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!("temp_{}_{}", self.schema_suffix, &random[..8])
    }
}
