//! Request routing between the job parameter summary and free-form questions
//!
//! ```rust,ignore
//! let mut bot = ChatBot::new(database, engine, config.chat.clone());
//! let answer = bot.respond(r#"Summarize the parameters for the job named "Acme Run""#).await?;
//! ```

pub mod error;
pub mod intent;
pub mod job_name;
pub mod qa;
pub mod repl;
pub mod schema;
pub mod session;
pub mod summarizer;

pub use error::{ChatError, ChatResult};
pub use intent::Intent;
pub use repl::{LineReader, ReedlineReader, RequestLoop, Responder};
pub use session::SessionMemory;

use crate::ai_sql::AiSqlEngine;
use crate::config::ChatConfig;
use crate::database::DatabaseClient;
use async_trait::async_trait;
use schema::SchemaInspector;
use std::time::Duration;
use summarizer::{ParameterSummarizer, SummaryRequest};
use tracing::info;

/// One conversation: its memory, its database and its model collaborator
pub struct ChatBot {
    database: Box<dyn DatabaseClient>,
    engine: AiSqlEngine,
    summarizer: ParameterSummarizer,
    memory: SessionMemory,
}

impl ChatBot {
    pub fn new(database: Box<dyn DatabaseClient>, engine: AiSqlEngine, config: ChatConfig) -> Self {
        let inspector = if config.cache_columns {
            SchemaInspector::cached(Duration::from_secs(config.column_cache_ttl_seconds))
        } else {
            SchemaInspector::uncached()
        };
        Self {
            database,
            engine,
            summarizer: ParameterSummarizer::new(config, inspector),
            memory: SessionMemory::new(),
        }
    }

    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    /// Forget cached column lists and schema context
    pub fn refresh_schema(&mut self) {
        self.summarizer.inspector_mut().clear();
        self.engine.clear_cache();
    }

    pub async fn respond(&mut self, input: &str) -> ChatResult<String> {
        match Intent::classify(input, self.summarizer.config()) {
            Intent::SummarizeJobParameters {
                job_name_hint,
                filter_to_awi,
            } => {
                info!("Routing to parameter summary (AWI only: {})", filter_to_awi);
                let request = SummaryRequest {
                    job_name_hint,
                    filter_to_awi,
                };
                self.summarizer
                    .summarize(
                        request,
                        &mut self.memory,
                        self.database.as_ref(),
                        self.engine.dialect(),
                    )
                    .await
            }
            Intent::GenericQuestion { text } => {
                qa::answer_question(&mut self.engine, self.database.as_ref(), &text).await
            }
        }
    }

    pub async fn close(&self) {
        self.database.close().await;
    }
}

#[async_trait]
impl Responder for ChatBot {
    async fn respond(&mut self, input: &str) -> ChatResult<String> {
        ChatBot::respond(self, input).await
    }

    fn refresh(&mut self) {
        self.refresh_schema();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_sql::tests::ScriptedProvider;
    use crate::ai_sql::{AiError, AiSqlConfig};
    use crate::chat::summarizer::tests::RecordingDatabase;
    use crate::chat::summarizer::NO_JOB_NAME_MESSAGE;
    use crate::database::DatabaseType;
    use std::sync::{Arc, Mutex};

    type Prompts = Arc<Mutex<Vec<(String, String)>>>;

    async fn bot(
        script: &[&str],
        responses: Vec<Result<String, AiError>>,
    ) -> (ChatBot, Prompts, crate::chat::summarizer::tests::BoundCalls) {
        let db = RecordingDatabase::with_script(script).await;
        let bound = db.bound_calls.clone();
        let (provider, prompts) = ScriptedProvider::new(responses);
        let engine = AiSqlEngine::new(AiSqlConfig::default(), Box::new(provider), DatabaseType::SQLite);
        (
            ChatBot::new(Box::new(db), engine, ChatConfig::default()),
            prompts,
            bound,
        )
    }

    const JOBS: &[&str] = &[
        "CREATE TABLE substrata_api_jobparameters (job_name TEXT, awi_score INTEGER, notes TEXT)",
        "INSERT INTO substrata_api_jobparameters VALUES ('Acme Run', 5, NULL)",
        "INSERT INTO substrata_api_jobparameters VALUES ('Job42', 7, 'slow')",
    ];

    #[tokio::test]
    async fn test_summary_then_follow_up_uses_memory() {
        let (mut bot, prompts, bound) = bot(JOBS, vec![]).await;

        let first = bot
            .respond(r#"Summarize the parameters for the job named "Acme Run" AWI"#)
            .await
            .unwrap();
        assert_eq!(first, "AWI Parameters for job_name Acme Run:\nawi_score: 5");

        let second = bot
            .respond("Summarize the parameters for the job named")
            .await
            .unwrap();
        assert_eq!(second, "Parameters for job_name Acme Run:\nawi_score: 5");

        assert_eq!(bound.lock().unwrap().len(), 2);
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_without_any_name() {
        let (mut bot, _, bound) = bot(JOBS, vec![]).await;
        let answer = bot
            .respond("Summarize the parameters for the job named")
            .await
            .unwrap();
        assert_eq!(answer, NO_JOB_NAME_MESSAGE);
        assert!(bound.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generic_question_goes_through_model_and_leaves_memory() {
        let (mut bot, prompts, bound) = bot(
            &[
                "CREATE TABLE Employee (EmployeeId INTEGER, LastName TEXT)",
                "INSERT INTO Employee VALUES (1, 'Adams'), (2, 'Edwards')",
            ],
            vec![
                Ok("SQLQuery: SELECT COUNT(*) FROM \"Employee\"".to_string()),
                Ok("There are 2 employees.".to_string()),
            ],
        )
        .await;

        let answer = bot.respond("How many employees are there").await.unwrap();
        assert_eq!(answer, "There are 2 employees.");
        assert_eq!(bot.memory().recall(), None);
        assert!(bound.lock().unwrap().is_empty());

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].1.contains("SQL Query: SELECT COUNT(*) FROM \"Employee\""));
        assert!(prompts[1].1.contains("SQL Result: [(2,)]"));
    }

    #[tokio::test]
    async fn test_refresh_exposes_new_tables_to_generation() {
        let (mut bot, prompts, _) = bot(
            &["CREATE TABLE Employee (EmployeeId INTEGER)"],
            vec![
                Ok("SELECT 1".to_string()),
                Ok("one".to_string()),
                Ok("SELECT 1".to_string()),
                Ok("one".to_string()),
            ],
        )
        .await;

        bot.respond("first").await.unwrap();
        bot.database
            .execute_query("CREATE TABLE Genre (GenreId INTEGER)")
            .await
            .unwrap();
        Responder::refresh(&mut bot);
        bot.respond("second").await.unwrap();

        let prompts = prompts.lock().unwrap();
        assert!(!prompts[0].1.contains("\"Genre\""));
        assert!(prompts[2].1.contains("CREATE TABLE \"Genre\""));
    }

    #[tokio::test]
    async fn test_generated_sql_failure_is_execution_error() {
        let (mut bot, _, _) = bot(
            &["CREATE TABLE Employee (EmployeeId INTEGER)"],
            vec![Ok("SELECT missing FROM Employee".to_string())],
        )
        .await;

        let err = bot.respond("Who is missing?").await.unwrap_err();
        assert!(matches!(err, ChatError::QueryExecution(_)));
    }

    #[tokio::test]
    async fn test_model_outage_is_collaborator_unavailable() {
        let (mut bot, _, _) = bot(
            &["CREATE TABLE Employee (EmployeeId INTEGER)"],
            vec![Err(AiError::AuthenticationError("401".to_string()))],
        )
        .await;

        let err = bot.respond("How many employees are there").await.unwrap_err();
        assert!(matches!(err, ChatError::CollaboratorUnavailable(_)));
    }
}
