//! PostgreSQL implementation of the database abstraction layer
use crate::database::{
    ColumnInfo, ConnectionInfo, DatabaseClient, DatabaseError, MetadataProvider, QueryResult, Row,
    Value,
};
use async_trait::async_trait;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _};
use tracing::debug;

/// PostgreSQL metadata provider implementation
pub struct PostgreSQLMetadataProvider {
    pool: PgPool,
}

impl PostgreSQLMetadataProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataProvider for PostgreSQLMetadataProvider {
    async fn get_tables(&self) -> Result<Vec<String>, DatabaseError> {
        debug!("[PostgreSQLMetadataProvider::get_tables] Starting query");

        let rows = sqlx::query(
            r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_type IN ('BASE TABLE', 'VIEW')
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let tables: Vec<String> = rows
            .iter()
            .map(|row| row.get::<String, _>("table_name"))
            .collect();

        debug!(
            "[PostgreSQLMetadataProvider::get_tables] Found {} tables",
            tables.len()
        );
        Ok(tables)
    }

    async fn get_column_details(&self, table: &str) -> Result<Vec<ColumnInfo>, DatabaseError> {
        debug!(
            "[PostgreSQLMetadataProvider::get_column_details] Starting query for table: '{}'",
            table
        );

        let rows = sqlx::query(
            r#"
            SELECT column_name::text AS column_name,
                   data_type::text AS data_type,
                   is_nullable::text AS is_nullable
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        // Every existing table has at least one column in the catalog
        if rows.is_empty() {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }

        let columns: Vec<ColumnInfo> = rows
            .iter()
            .map(|row| ColumnInfo {
                name: row.get::<String, _>("column_name"),
                data_type: row.get::<String, _>("data_type"),
                nullable: row.get::<String, _>("is_nullable") == "YES",
            })
            .collect();

        debug!(
            "[PostgreSQLMetadataProvider::get_column_details] Found {} columns",
            columns.len()
        );
        Ok(columns)
    }
}

/// PostgreSQL database client implementation
pub struct PostgreSQLClient {
    pool: PgPool,
    connection_info: ConnectionInfo,
    current_database: String,
    metadata_provider: PostgreSQLMetadataProvider,
}

impl PostgreSQLClient {
    pub async fn new(connection_info: ConnectionInfo) -> Result<Self, DatabaseError> {
        debug!("[PostgreSQLClient::new] Creating PostgreSQL client");

        let pool = PgPoolOptions::new()
            .max_connections(4)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(15))
            .idle_timeout(std::time::Duration::from_secs(300))
            .connect(&connection_info.url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let current_database: String = sqlx::query_scalar("SELECT current_database()::text")
            .fetch_one(&pool)
            .await?;

        let metadata_provider = PostgreSQLMetadataProvider::new(pool.clone());

        Ok(Self {
            pool,
            connection_info,
            current_database,
            metadata_provider,
        })
    }

    fn collect_rows(rows: &[PgRow]) -> Result<QueryResult, DatabaseError> {
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let mut result_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let mut out = Row::new();
            for (index, column) in row.columns().iter().enumerate() {
                out.push(column.name(), decode_postgresql_value(row, index)?);
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
impl DatabaseClient for PostgreSQLClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult, DatabaseError> {
        debug!("[PostgreSQLClient::execute_query] Executing query: {}", sql);

        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Self::collect_rows(&rows)
    }

    async fn execute_bound(&self, sql: &str, params: &[&str]) -> Result<QueryResult, DatabaseError> {
        debug!(
            "[PostgreSQLClient::execute_bound] Executing query with {} parameters: {}",
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

/// Decode a PostgreSQL cell according to its column type
fn decode_postgresql_value(row: &PgRow, column_index: usize) -> Result<Value, DatabaseError> {
    use sqlx::TypeInfo;
    use sqlx::ValueRef;

    if row.try_get_raw(column_index)?.is_null() {
        return Ok(Value::Null);
    }

    let column = row.column(column_index);
    let type_name = column.type_info().name().to_uppercase();

    let value = match type_name.as_str() {
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            Value::Text(row.try_get::<String, _>(column_index)?)
        }
        "INT2" | "SMALLINT" => Value::Integer(i64::from(row.try_get::<i16, _>(column_index)?)),
        "INT4" | "INTEGER" | "SERIAL" => {
            Value::Integer(i64::from(row.try_get::<i32, _>(column_index)?))
        }
        "INT8" | "BIGINT" | "BIGSERIAL" => Value::Integer(row.try_get::<i64, _>(column_index)?),
        "FLOAT4" | "REAL" => Value::Real(widen_f32(row.try_get::<f32, _>(column_index)?)),
        "FLOAT8" | "DOUBLE PRECISION" => Value::Real(row.try_get::<f64, _>(column_index)?),
        // Kept as text so precision survives
        "NUMERIC" | "DECIMAL" => {
            Value::Text(row.try_get::<sqlx::types::Decimal, _>(column_index)?.to_string())
        }
        "BOOL" | "BOOLEAN" => Value::Boolean(row.try_get::<bool, _>(column_index)?),
        "TIMESTAMPTZ" => Value::Text(
            row.try_get::<chrono::DateTime<chrono::Utc>, _>(column_index)?
                .to_rfc3339(),
        ),
        "TIMESTAMP" => Value::Text(
            row.try_get::<chrono::NaiveDateTime, _>(column_index)?
                .to_string(),
        ),
        "DATE" => Value::Text(row.try_get::<chrono::NaiveDate, _>(column_index)?.to_string()),
        "TIME" => Value::Text(row.try_get::<chrono::NaiveTime, _>(column_index)?.to_string()),
        "JSON" | "JSONB" => Value::Text(
            row.try_get::<serde_json::Value, _>(column_index)?
                .to_string(),
        ),
        "BYTEA" => Value::Blob(row.try_get::<Vec<u8>, _>(column_index)?),
        "UUID" => Value::Text(row.try_get::<sqlx::types::Uuid, _>(column_index)?.to_string()),
        "INTERVAL" => {
            let interval = row.try_get::<PgInterval, _>(column_index)?;
            Value::Text(format_interval(
                interval.months,
                interval.days,
                interval.microseconds,
            ))
        }
        other => match row.try_get::<String, _>(column_index) {
            Ok(text) => Value::Text(text),
            Err(e) => {
                return Err(DatabaseError::QueryError(format!(
                    "cannot decode column '{}' of type {}: {}; cast it to text in the query",
                    column.name(),
                    other,
                    e
                )));
            }
        },
    };
    Ok(value)
}

/// Widen a `real` through its shortest decimal form, so `0.1` stays `0.1`
fn widen_f32(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

/// Render an interval the way psql does, e.g. `1 year 2 mons 3 days 04:05:06.5`
fn format_interval(months: i32, days: i32, microseconds: i64) -> String {
    let mut parts = Vec::new();
    let (years, months) = (months / 12, months % 12);
    for (amount, singular, plural) in [(years, "year", "years"), (months, "mon", "mons"), (days, "day", "days")] {
        if amount != 0 {
            let unit = if amount.abs() == 1 { singular } else { plural };
            parts.push(format!("{amount} {unit}"));
        }
    }

    if microseconds != 0 || parts.is_empty() {
        let sign = if microseconds < 0 { "-" } else { "" };
        let total = microseconds.unsigned_abs();
        let (seconds, fraction) = (total / 1_000_000, total % 1_000_000);
        let mut clock = format!(
            "{sign}{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds / 60) % 60,
            seconds % 60
        );
        if fraction != 0 {
            let digits = format!("{fraction:06}");
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }

    parts.join(" ")
}
