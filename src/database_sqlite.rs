//! SQLite implementation of the database abstraction layer
use crate::database::{
    quote_identifier, ColumnInfo, ConnectionInfo, DatabaseClient, DatabaseError, MetadataProvider,
    QueryResult, Row, Value,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _};
use tracing::debug;

/// SQLite metadata provider implementation
pub struct SqliteMetadataProvider {
    pool: SqlitePool,
}

impl SqliteMetadataProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        let found = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl MetadataProvider for SqliteMetadataProvider {
    async fn get_tables(&self) -> Result<Vec<String>, DatabaseError> {
        debug!("[SqliteMetadataProvider::get_tables] Starting query");

        let rows = sqlx::query(
            r#"
            SELECT name as table_name
            FROM sqlite_master
            WHERE type IN ('table', 'view')
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let tables: Vec<String> = rows
            .iter()
            .map(|row| row.get::<String, _>("table_name"))
            .collect();

        debug!(
            "[SqliteMetadataProvider::get_tables] Found {} tables",
            tables.len()
        );
        Ok(tables)
    }

    async fn get_column_details(&self, table: &str) -> Result<Vec<ColumnInfo>, DatabaseError> {
        debug!(
            "[SqliteMetadataProvider::get_column_details] Starting query for table: '{}'",
            table
        );

        // PRAGMA table_info returns nothing for unknown tables
        if !self.table_exists(table).await? {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }

        let query = format!("PRAGMA table_info({})", quote_identifier(table));
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let columns: Vec<ColumnInfo> = rows
            .iter()
            .map(|row| ColumnInfo {
                name: row.get::<String, _>("name"),
                data_type: row.get::<String, _>("type"),
                nullable: row.get::<i32, _>("notnull") == 0,
            })
            .collect();

        debug!(
            "[SqliteMetadataProvider::get_column_details] Found {} columns",
            columns.len()
        );
        Ok(columns)
    }
}

/// SQLite database client implementation
pub struct SqliteClient {
    pool: SqlitePool,
    connection_info: ConnectionInfo,
    current_database: String,
    metadata_provider: SqliteMetadataProvider,
}

impl SqliteClient {
    pub async fn new(connection_info: ConnectionInfo) -> Result<Self, DatabaseError> {
        debug!("[SqliteClient::new] Creating SQLite client");

        let file_path = connection_info.file_path.as_ref().ok_or_else(|| {
            DatabaseError::ConnectionError(
                "No file path provided for SQLite connection".to_string(),
            )
        })?;

        // Each in-memory connection is its own database, so keep exactly one
        let max_connections = if connection_info.is_in_memory() { 1 } else { 5 };

        debug!("[SqliteClient::new] Connecting to: {}", connection_info.url);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(&connection_info.url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let metadata_provider = SqliteMetadataProvider::new(pool.clone());

        let current_database = std::path::Path::new(file_path)
            .file_stem()
            .and_then(|os_str| os_str.to_str())
            .unwrap_or("main")
            .to_string();

        Ok(Self {
            pool,
            connection_info,
            current_database,
            metadata_provider,
        })
    }

    fn collect_rows(rows: &[SqliteRow]) -> Result<QueryResult, DatabaseError> {
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let mut result_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let mut out = Row::new();
            for (index, column) in row.columns().iter().enumerate() {
                out.push(column.name(), decode_sqlite_value(row, index)?);
            }
            result_rows.push(out);
        }

        Ok(QueryResult {
            columns,
            rows: result_rows,
        })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult, DatabaseError> {
        debug!("[SqliteClient::execute_query] Executing query: {}", sql);

        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Self::collect_rows(&rows)
    }

    async fn execute_bound(&self, sql: &str, params: &[&str]) -> Result<QueryResult, DatabaseError> {
        debug!(
            "[SqliteClient::execute_bound] Executing query with {} parameters: {}",
            params.len(),
            sql
        );

        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Self::collect_rows(&rows)
    }

    fn get_current_database(&self) -> String {
        self.current_database.clone()
    }

    fn get_connection_info(&self) -> &ConnectionInfo {
        &self.connection_info
    }

    fn get_metadata_provider(&self) -> &dyn MetadataProvider {
        &self.metadata_provider
    }

    async fn is_connected(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Decode a SQLite cell using its runtime storage class
fn decode_sqlite_value(row: &SqliteRow, column_index: usize) -> Result<Value, DatabaseError> {
    use sqlx::TypeInfo;
    use sqlx::ValueRef;

    // SQLite is dynamically typed, the declared column type is only a hint
    let storage_class = {
        let value_ref = row.try_get_raw(column_index)?;
        if value_ref.is_null() {
            return Ok(Value::Null);
        }
        value_ref.type_info().name().to_uppercase()
    };

    let value = match storage_class.as_str() {
        "INTEGER" | "INT" | "BIGINT" => Value::Integer(row.try_get::<i64, _>(column_index)?),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => Value::Real(row.try_get::<f64, _>(column_index)?),
        "BOOLEAN" => Value::Boolean(row.try_get::<bool, _>(column_index)?),
        "BLOB" => Value::Blob(row.try_get::<Vec<u8>, _>(column_index)?),
        "TEXT" | "DATETIME" | "DATE" | "TIME" => Value::Text(row.try_get::<String, _>(column_index)?),
        other => {
            if let Ok(val) = row.try_get::<i64, _>(column_index) {
                Value::Integer(val)
            } else if let Ok(val) = row.try_get::<f64, _>(column_index) {
                Value::Real(val)
            } else if let Ok(val) = row.try_get::<String, _>(column_index) {
                Value::Text(val)
            } else {
                return Err(DatabaseError::QueryError(format!(
                    "Unable to decode SQLite {other} value at column {column_index}"
                )));
            }
        }
    };
    Ok(value)
}
