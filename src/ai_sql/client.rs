//! AI provider client implementations

use crate::ai_sql::config::{AiProviderType, AiSqlConfig};
use crate::ai_sql::error::{AiError, AiResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// API key for the language model, redacted from every `Debug` rendering
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting blank input
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() { None } else { Some(Self(raw)) }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Trait for AI providers: one system + user prompt in, completion text out
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        config: &AiSqlConfig,
    ) -> AiResult<String>;

    /// Get provider name
    fn name(&self) -> &str;
}

fn build_http_client(timeout_seconds: u64) -> AiResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| AiError::NetworkError(format!("Failed to create HTTP client: {}", e)))
}

fn map_send_error(error: reqwest::Error, timeout_seconds: u64) -> AiError {
    if error.is_timeout() {
        AiError::TimeoutError {
            timeout_secs: timeout_seconds,
        }
    } else {
        AiError::NetworkError(format!("Request failed: {}", error))
    }
}

async fn check_status(response: reqwest::Response) -> AiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AiError::AuthenticationError(format!(
            "{} rejected the API key",
            status
        )));
    }

    Err(AiError::ApiError {
        status_code: status.as_u16(),
        message: error_text,
    })
}

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    client: Client,
    api_key: ApiKey,
    base_url: String,
    model: String,
    timeout_seconds: u64,
}

impl OpenAiProvider {
    pub fn new(api_key: ApiKey, base_url: String, model: String, timeout_seconds: u64) -> AiResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_seconds)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout_seconds,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        config: &AiSqlConfig,
    ) -> AiResult<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = OpenAiRequest {
            model: self.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
        };

        debug!(
            "Calling OpenAI API with model: {}, max_tokens: {}, temperature: {}",
            self.model, config.max_tokens, config.temperature
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_seconds))?;

        let response_body: OpenAiResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AiError::ProviderError(format!("Failed to parse API response: {}", e)))?;

        response_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::ProviderError("No content in response".to_string()))
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

/// Anthropic Claude provider implementation
pub struct AnthropicProvider {
    client: Client,
    api_key: ApiKey,
    base_url: String,
    model: String,
    timeout_seconds: u64,
}

impl AnthropicProvider {
    pub fn new(api_key: ApiKey, base_url: String, model: String, timeout_seconds: u64) -> AiResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_seconds)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout_seconds,
        })
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        config: &AiSqlConfig,
    ) -> AiResult<String> {
        let url = format!("{}/v1/messages", self.base_url);

        let request_body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system: Some(system_prompt.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            }],
        };

        debug!(
            "Calling Anthropic API with model: {}, max_tokens: {}, temperature: {}",
            self.model, config.max_tokens, config.temperature
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_seconds))?;

        let response_body: AnthropicResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AiError::ProviderError(format!("Failed to parse API response: {}", e)))?;

        // Extract text content from the first content block
        if let Some(content) = response_body.content.first() {
            Ok(content.text.clone())
        } else {
            Err(AiError::ProviderError(
                "No content in response".to_string(),
            ))
        }
    }

    fn name(&self) -> &str {
        "Anthropic Claude"
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

/// Create AI client based on configuration
pub fn create_ai_client(config: &AiSqlConfig, api_key: ApiKey) -> AiResult<Box<dyn AiProvider>> {
    config.validate().map_err(AiError::ConfigurationError)?;

    match config.provider {
        AiProviderType::OpenAI => Ok(Box::new(OpenAiProvider::new(
            api_key,
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            config.timeout_seconds,
        )?)),
        AiProviderType::Anthropic => Ok(Box::new(AnthropicProvider::new(
            api_key,
            config.anthropic_base_url.clone(),
            config.anthropic_model.clone(),
            config.timeout_seconds,
        )?)),
    }
}
