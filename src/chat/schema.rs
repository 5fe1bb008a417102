//! Column lookup for the parameter table

use crate::chat::error::{schema_error, ChatResult};
use crate::database::DatabaseClient;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    columns: Vec<String>,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Reads column names from the catalog, optionally caching them per table.
///
/// Without a cache every call hits the catalog, so schema changes are
/// picked up on the next request.
pub struct SchemaInspector {
    cache: Option<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl SchemaInspector {
    /// Inspector that always reads the live catalog
    pub fn uncached() -> Self {
        Self {
            cache: None,
            ttl: Duration::ZERO,
        }
    }

    pub fn cached(ttl: Duration) -> Self {
        Self {
            cache: Some(HashMap::new()),
            ttl,
        }
    }

    /// Column names of `table` in catalog order
    pub async fn columns(
        &mut self,
        database: &dyn DatabaseClient,
        table: &str,
    ) -> ChatResult<Vec<String>> {
        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.get(table) {
                if !entry.is_expired(self.ttl) {
                    debug!("Column cache hit for {}", table);
                    return Ok(entry.columns.clone());
                }
            }
        }

        let columns = database
            .get_metadata_provider()
            .get_columns(table)
            .await
            .map_err(schema_error)?;
        debug!("Read {} columns of {} from catalog", columns.len(), table);

        if let Some(cache) = &mut self.cache {
            cache.insert(
                table.to_string(),
                CacheEntry {
                    columns: columns.clone(),
                    created_at: Instant::now(),
                },
            );
        }
        Ok(columns)
    }

    /// Drop cached columns for `table`
    pub fn invalidate(&mut self, table: &str) {
        if let Some(cache) = &mut self.cache {
            cache.remove(table);
        }
    }

    pub fn clear(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::error::ChatError;
    use crate::database::{create_database_client, ConnectionInfo};

    async fn jobs_db() -> Box<dyn DatabaseClient> {
        let info = ConnectionInfo::parse("sqlite::memory:").unwrap();
        let db = create_database_client(info).await.unwrap();
        db.execute_query("CREATE TABLE jobs (job_name TEXT, awi_score INTEGER)")
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_uncached_sees_schema_changes() {
        let db = jobs_db().await;
        let mut inspector = SchemaInspector::uncached();

        assert_eq!(
            inspector.columns(db.as_ref(), "jobs").await.unwrap(),
            vec!["job_name", "awi_score"]
        );
        db.execute_query("ALTER TABLE jobs ADD COLUMN notes TEXT")
            .await
            .unwrap();
        assert_eq!(
            inspector.columns(db.as_ref(), "jobs").await.unwrap(),
            vec!["job_name", "awi_score", "notes"]
        );
    }

    #[tokio::test]
    async fn test_cached_until_invalidated() {
        let db = jobs_db().await;
        let mut inspector = SchemaInspector::cached(Duration::from_secs(300));

        assert_eq!(inspector.columns(db.as_ref(), "jobs").await.unwrap().len(), 2);
        db.execute_query("ALTER TABLE jobs ADD COLUMN notes TEXT")
            .await
            .unwrap();
        assert_eq!(inspector.columns(db.as_ref(), "jobs").await.unwrap().len(), 2);

        inspector.invalidate("jobs");
        assert_eq!(inspector.columns(db.as_ref(), "jobs").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_table_is_schema_error() {
        let db = jobs_db().await;
        let mut inspector = SchemaInspector::uncached();
        let err = inspector.columns(db.as_ref(), "absent").await.unwrap_err();
        assert!(matches!(err, ChatError::Schema(_)));
    }
}
