//! Language-model collaborator: natural language to SQL, and SQL results back to prose
//!
//! # Usage
//!
//! ```rust,ignore
//! use dbchat::ai_sql::{AiSqlConfig, AiSqlEngine, ApiKey, create_ai_client};
//!
//! let config = AiSqlConfig::default();
//! let client = create_ai_client(&config, api_key)?;
//! let mut engine = AiSqlEngine::new(config, client, database.get_connection_info().database_type);
//! let sql = engine.generate_sql("How many employees are there", database.as_ref()).await?;
//! ```

pub mod client;
pub mod config;
pub mod dialect;
pub mod error;
pub mod prompt;
pub mod schema;

pub use client::{create_ai_client, AiProvider, ApiKey};
pub use config::{AiProviderType, AiSqlConfig};
pub use dialect::{create_dialect_provider, SqlDialectProvider};
pub use error::{AiError, AiResult};
pub use prompt::PromptGenerator;
pub use schema::{SchemaContext, SchemaExtractor};

use crate::database::{DatabaseClient, DatabaseError, DatabaseType};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Errors from SQL generation, which needs both the catalog and the model
#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Schema(#[from] DatabaseError),

    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Orchestrates SQL generation and answer synthesis against one provider
pub struct AiSqlEngine {
    config: AiSqlConfig,
    ai_client: Box<dyn AiProvider>,
    dialect_provider: Box<dyn SqlDialectProvider>,
    schema_extractor: SchemaExtractor,
}

impl AiSqlEngine {
    pub fn new(
        config: AiSqlConfig,
        ai_client: Box<dyn AiProvider>,
        database_type: DatabaseType,
    ) -> Self {
        let schema_extractor =
            SchemaExtractor::with_ttl(Duration::from_secs(config.schema_cache_ttl_seconds));
        Self {
            config,
            ai_client,
            dialect_provider: create_dialect_provider(database_type),
            schema_extractor,
        }
    }

    pub fn dialect(&self) -> &dyn SqlDialectProvider {
        self.dialect_provider.as_ref()
    }

    /// Generate SQL for a natural-language question
    pub async fn generate_sql(
        &mut self,
        question: &str,
        database: &dyn DatabaseClient,
    ) -> Result<String, GenerationError> {
        info!("Generating SQL with {}", self.ai_client.name());

        let schema_context = self
            .schema_extractor
            .extract_context(database, &self.config)
            .await?;

        let system_prompt = self.dialect_provider.system_prompt(self.config.top_k);
        let schema_info = self.dialect_provider.format_schema_context(&schema_context);
        let user_prompt = PromptGenerator::sql_prompt(question, &schema_info);

        debug!("System prompt length: {} chars", system_prompt.len());
        debug!("User prompt length: {} chars", user_prompt.len());

        let raw = self.complete_with_retries(&system_prompt, &user_prompt).await?;
        let sql = PromptGenerator::extract_sql(&raw);
        if sql.is_empty() {
            return Err(AiError::ProviderError("Model returned an empty query".to_string()).into());
        }

        debug!("Generated SQL: {}", sql);
        Ok(sql)
    }

    /// Turn a question, the query that was run and its result into prose
    pub async fn answer(&self, question: &str, query: &str, result: &str) -> AiResult<String> {
        let system_prompt = PromptGenerator::answer_system_prompt();
        let user_prompt = PromptGenerator::answer_prompt(question, query, result);

        let answer = self.complete_with_retries(&system_prompt, &user_prompt).await?;
        Ok(answer.trim().to_string())
    }

    /// Forget cached schema context
    pub fn clear_cache(&mut self) {
        self.schema_extractor.clear_cache();
        info!("Schema context cache cleared");
    }

    async fn complete_with_retries(&self, system_prompt: &str, user_prompt: &str) -> AiResult<String> {
        let mut attempt = 0;
        loop {
            match self
                .ai_client
                .complete(system_prompt, user_prompt, &self.config)
                .await
            {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} request failed ({}), retry {}/{}",
                        self.ai_client.name(),
                        e,
                        attempt,
                        self.config.max_retries
                    );
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::{ConnectionInfo, create_database_client};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records the prompts it saw
    pub(crate) struct ScriptedProvider {
        responses: Mutex<VecDeque<AiResult<String>>>,
        prompts: std::sync::Arc<Mutex<Vec<(String, String)>>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(
            responses: Vec<AiResult<String>>,
        ) -> (Self, std::sync::Arc<Mutex<Vec<(String, String)>>>) {
            let prompts = std::sync::Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    responses: Mutex::new(responses.into()),
                    prompts: prompts.clone(),
                },
                prompts,
            )
        }
    }

    #[async_trait]
    impl AiProvider for ScriptedProvider {
        async fn complete(
            &self,
            system_prompt: &str,
            user_prompt: &str,
            _config: &AiSqlConfig,
        ) -> AiResult<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_prompt.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AiError::ProviderError("script exhausted".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    async fn employees_db() -> Box<dyn DatabaseClient> {
        let info = ConnectionInfo::parse("sqlite::memory:").unwrap();
        let db = create_database_client(info).await.unwrap();
        db.execute_query("CREATE TABLE Employee (EmployeeId INTEGER, LastName TEXT)")
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_generate_sql_sends_schema_and_cleans_output() {
        let db = employees_db().await;
        let (provider, prompts) = ScriptedProvider::new(vec![Ok(
            "```sql\nSELECT COUNT(*) FROM \"Employee\";\n```".to_string(),
        )]);
        let mut engine = AiSqlEngine::new(AiSqlConfig::default(), Box::new(provider), DatabaseType::SQLite);

        let sql = engine
            .generate_sql("How many employees are there", db.as_ref())
            .await
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM \"Employee\";");

        let prompts = prompts.lock().unwrap();
        assert!(prompts[0].0.contains("SQLite expert"));
        assert!(prompts[0].1.contains("CREATE TABLE \"Employee\""));
        assert!(prompts[0].1.contains("Question: How many employees are there"));
    }

    #[tokio::test]
    async fn test_generate_sql_retries_transient_failures() {
        let db = employees_db().await;
        let (provider, prompts) = ScriptedProvider::new(vec![
            Err(AiError::NetworkError("reset".into())),
            Ok("SELECT 1".to_string()),
        ]);
        let config = AiSqlConfig {
            max_retries: 1,
            ..AiSqlConfig::default()
        };
        let mut engine = AiSqlEngine::new(config, Box::new(provider), DatabaseType::SQLite);

        let sql = engine.generate_sql("anything", db.as_ref()).await.unwrap();
        assert_eq!(sql, "SELECT 1");
        assert_eq!(prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_sql_does_not_retry_auth_failures() {
        let db = employees_db().await;
        let (provider, prompts) = ScriptedProvider::new(vec![
            Err(AiError::AuthenticationError("bad key".into())),
            Ok("SELECT 1".to_string()),
        ]);
        let mut engine = AiSqlEngine::new(AiSqlConfig::default(), Box::new(provider), DatabaseType::SQLite);

        let err = engine.generate_sql("anything", db.as_ref()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Ai(AiError::AuthenticationError(_))));
        assert_eq!(prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_schema_context_reuse_follows_configured_ttl() {
        let db = employees_db().await;
        let (provider, prompts) = ScriptedProvider::new(vec![
            Ok("SELECT 1".to_string()),
            Ok("SELECT 1".to_string()),
            Ok("SELECT 1".to_string()),
        ]);
        let mut engine = AiSqlEngine::new(AiSqlConfig::default(), Box::new(provider), DatabaseType::SQLite);

        engine.generate_sql("first", db.as_ref()).await.unwrap();
        db.execute_query("CREATE TABLE Genre (GenreId INTEGER)").await.unwrap();
        engine.generate_sql("second", db.as_ref()).await.unwrap();
        engine.clear_cache();
        engine.generate_sql("third", db.as_ref()).await.unwrap();

        let prompts = prompts.lock().unwrap();
        assert!(!prompts[1].1.contains("\"Genre\""));
        assert!(prompts[2].1.contains("CREATE TABLE \"Genre\""));
    }

    #[tokio::test]
    async fn test_zero_ttl_reads_catalog_every_time() {
        let db = employees_db().await;
        let (provider, prompts) = ScriptedProvider::new(vec![
            Ok("SELECT 1".to_string()),
            Ok("SELECT 1".to_string()),
        ]);
        let config = AiSqlConfig {
            schema_cache_ttl_seconds: 0,
            ..AiSqlConfig::default()
        };
        let mut engine = AiSqlEngine::new(config, Box::new(provider), DatabaseType::SQLite);

        engine.generate_sql("first", db.as_ref()).await.unwrap();
        db.execute_query("CREATE TABLE Genre (GenreId INTEGER)").await.unwrap();
        engine.generate_sql("second", db.as_ref()).await.unwrap();

        assert!(prompts.lock().unwrap()[1].1.contains("CREATE TABLE \"Genre\""));
    }

    #[tokio::test]
    async fn test_generate_sql_rejects_empty_output() {
        let db = employees_db().await;
        let (provider, _) = ScriptedProvider::new(vec![Ok("```sql\n```".to_string())]);
        let mut engine = AiSqlEngine::new(AiSqlConfig::default(), Box::new(provider), DatabaseType::SQLite);

        assert!(engine.generate_sql("anything", db.as_ref()).await.is_err());
    }

    #[tokio::test]
    async fn test_answer_uses_answer_template() {
        let (provider, prompts) = ScriptedProvider::new(vec![Ok(" There are 8 employees. ".to_string())]);
        let engine = AiSqlEngine::new(AiSqlConfig::default(), Box::new(provider), DatabaseType::SQLite);

        let answer = engine
            .answer("How many employees are there", "SELECT COUNT(*) FROM Employee", "[(8,)]")
            .await
            .unwrap();
        assert_eq!(answer, "There are 8 employees.");
        assert!(prompts.lock().unwrap()[0].1.contains("SQL Result: [(8,)]"));
    }
}
