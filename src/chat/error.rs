//! Per-request failures, rendered by the request loop

use crate::ai_sql::{AiError, GenerationError};
use crate::database::DatabaseError;
use thiserror::Error;

pub type ChatResult<T> = Result<T, ChatError>;

/// Errors that end a single request but never the session
#[derive(Error, Debug)]
pub enum ChatError {
    /// Table missing or catalog unreachable
    #[error("Schema error: {0}")]
    Schema(String),

    /// Hand-built or generated SQL failed to execute
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// Language-model service unreachable, unauthorized or misbehaving
    #[error("Language model unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl ChatError {
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Schema(msg) => {
                format!("Could not read the table schema: {msg}. Check the configured table and database.")
            }
            ChatError::QueryExecution(msg) => format!("The query failed: {msg}"),
            ChatError::CollaboratorUnavailable(msg) => msg.clone(),
        }
    }
}

impl From<AiError> for ChatError {
    fn from(error: AiError) -> Self {
        ChatError::CollaboratorUnavailable(error.user_message())
    }
}

impl From<GenerationError> for ChatError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::Schema(e) => ChatError::Schema(e.to_string()),
            GenerationError::Ai(e) => e.into(),
        }
    }
}

/// Catalog failures map to `Schema`; use `ChatError::QueryExecution` explicitly for query failures
pub(crate) fn schema_error(error: DatabaseError) -> ChatError {
    ChatError::Schema(error.to_string())
}

pub(crate) fn execution_error(error: DatabaseError) -> ChatError {
    ChatError::QueryExecution(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_errors_become_collaborator_unavailable() {
        let err: ChatError = AiError::AuthenticationError("401".into()).into();
        assert!(matches!(err, ChatError::CollaboratorUnavailable(_)));
        assert!(err.user_message().contains("API key"));
    }

    #[test]
    fn test_generation_schema_errors_become_schema() {
        let err: ChatError =
            GenerationError::Schema(DatabaseError::TableNotFound("jobs".into())).into();
        assert!(matches!(err, ChatError::Schema(ref m) if m.contains("jobs")));
    }

    #[test]
    fn test_helpers() {
        assert!(matches!(
            schema_error(DatabaseError::MetadataError("x".into())),
            ChatError::Schema(_)
        ));
        assert!(matches!(
            execution_error(DatabaseError::QueryError("x".into())),
            ChatError::QueryExecution(_)
        ));
    }
}
