//! Error types for the language-model collaborator

use thiserror::Error;

/// Result type for AI operations
pub type AiResult<T> = Result<T, AiError>;

/// Errors that can occur while talking to the language model
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI provider error: {0}")]
    ProviderError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {status_code} - {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Timeout error: operation took longer than {timeout_secs}s")]
    TimeoutError { timeout_secs: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AiError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::NetworkError(_) | AiError::TimeoutError { .. } => true,
            AiError::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            _ => false,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AiError::ProviderError(msg) => format!("AI provider error: {}", msg),
            AiError::ConfigurationError(msg) => {
                format!("Configuration issue: {}. Check your config file or environment variables.", msg)
            }
            AiError::NetworkError(msg) => {
                format!("Network error: {}. Check your internet connection.", msg)
            }
            AiError::ApiError {
                status_code,
                message,
            } => format!("API error ({}): {}", status_code, message),
            AiError::AuthenticationError(msg) => {
                format!("Authentication error: {}. Check the API key you entered at startup.", msg)
            }
            AiError::TimeoutError { timeout_secs } => {
                format!("Request timed out after {} seconds. Try again or increase timeout_seconds in config.", timeout_secs)
            }
            _ => self.to_string(),
        }
    }
}
