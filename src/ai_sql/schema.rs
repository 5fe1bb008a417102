//! Schema extraction for AI SQL generation
//!
//! Collects table and column metadata (and optionally a few sample rows) so
//! the model only writes queries against columns that exist.

use crate::ai_sql::config::AiSqlConfig;
use crate::database::{
    quote_identifier, ColumnInfo, DatabaseClient, DatabaseError, DatabaseType, QueryResult,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Table metadata with columns and optional sample rows
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub sample_rows: Option<QueryResult>,
}

/// Complete schema context for AI SQL generation
#[derive(Debug, Clone)]
pub struct SchemaContext {
    pub database_type: DatabaseType,
    pub current_database: String,
    pub tables: Vec<TableMetadata>,
}

/// Schema extractor with a TTL cache keyed by database name
pub struct SchemaExtractor {
    cache: HashMap<String, (SchemaContext, Instant)>,
    cache_ttl: Duration,
}

impl SchemaExtractor {
    /// Create a new schema extractor
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(300))
    }

    pub fn with_ttl(cache_ttl: Duration) -> Self {
        Self {
            cache: HashMap::new(),
            cache_ttl,
        }
    }

    /// Extract schema context from database
    pub async fn extract_context(
        &mut self,
        database: &dyn DatabaseClient,
        config: &AiSqlConfig,
    ) -> Result<SchemaContext, DatabaseError> {
        let db_name = database.get_current_database();

        if let Some((cached, at)) = self.cache.get(&db_name) {
            if at.elapsed() < self.cache_ttl {
                debug!("Using cached schema context for database: {}", db_name);
                return Ok(cached.clone());
            }
        }

        info!("Extracting schema context for database: {}", db_name);

        let metadata = database.get_metadata_provider();
        let mut table_names = metadata.get_tables().await?;
        table_names.truncate(config.max_tables);

        let mut tables = Vec::with_capacity(table_names.len());
        for table_name in table_names {
            let columns = match metadata.get_column_details(&table_name).await {
                Ok(columns) => columns,
                Err(e) => {
                    debug!("Failed to extract metadata for table {}: {}", table_name, e);
                    continue;
                }
            };

            let sample_rows = if config.include_sample_data && config.sample_data_rows > 0 {
                let sql = format!(
                    "SELECT * FROM {} LIMIT {}",
                    quote_identifier(&table_name),
                    config.sample_data_rows
                );
                database.execute_query(&sql).await.ok()
            } else {
                None
            };

            tables.push(TableMetadata {
                name: table_name,
                columns,
                sample_rows,
            });
        }

        debug!("Schema context covers {} tables", tables.len());

        let context = SchemaContext {
            database_type: database.get_connection_info().database_type,
            current_database: db_name.clone(),
            tables,
        };

        self.cache.insert(db_name, (context.clone(), Instant::now()));
        Ok(context)
    }

    /// Clear the cache
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for SchemaExtractor {
    fn default() -> Self {
        Self::new()
    }
}
