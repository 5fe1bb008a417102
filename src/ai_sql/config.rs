//! Configuration for the language-model collaborator

use serde::{Deserialize, Serialize};

/// AI provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderType {
    #[default]
    OpenAI,
    Anthropic,
}

impl AiProviderType {
    /// Environment variable consulted before prompting for a key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            AiProviderType::OpenAI => "OPENAI_API_KEY",
            AiProviderType::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AiProviderType::OpenAI => "OpenAI",
            AiProviderType::Anthropic => "Anthropic",
        }
    }
}

impl std::str::FromStr for AiProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(format!("unknown AI provider '{other}' (expected openai or anthropic)")),
        }
    }
}

/// Configuration for SQL generation and answer generation
///
/// The API key is deliberately absent: it is entered at startup and never
/// written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSqlConfig {
    /// AI provider to use
    pub provider: AiProviderType,

    // === OpenAI Configuration ===
    pub openai_model: String,
    pub openai_base_url: String,

    // === Anthropic Configuration ===
    pub anthropic_model: String,
    pub anthropic_base_url: String,

    // === Generation Parameters ===
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Retries for transient failures (network, 429, 5xx)
    pub max_retries: u32,

    // === Schema Context Configuration ===
    /// Row limit the model is told to apply unless the question asks otherwise
    pub top_k: usize,

    /// Maximum number of tables to include
    pub max_tables: usize,

    /// Include sample data rows (privacy risk!)
    pub include_sample_data: bool,

    /// Number of sample rows if enabled
    pub sample_data_rows: usize,

    /// Seconds a schema context is reused before the catalog is read again; 0 disables
    pub schema_cache_ttl_seconds: u64,
}

impl Default for AiSqlConfig {
    fn default() -> Self {
        Self {
            provider: AiProviderType::OpenAI,

            openai_model: "gpt-3.5-turbo".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),

            anthropic_model: "claude-sonnet-4-5-20250929".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),

            temperature: 0.0, // Deterministic for SQL generation
            max_tokens: 1024,
            timeout_seconds: 30,
            max_retries: 2,

            top_k: 5,
            max_tables: 50,
            include_sample_data: false, // Privacy default
            sample_data_rows: 3,
            schema_cache_ttl_seconds: 300,
        }
    }
}

impl AiSqlConfig {
    /// Model name for the selected provider
    pub fn model(&self) -> &str {
        match self.provider {
            AiProviderType::OpenAI => &self.openai_model,
            AiProviderType::Anthropic => &self.anthropic_model,
        }
    }

    /// Override the model for the selected provider
    pub fn set_model(&mut self, model: String) {
        match self.provider {
            AiProviderType::OpenAI => self.openai_model = model,
            AiProviderType::Anthropic => self.anthropic_model = model,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model().trim().is_empty() {
            return Err(format!("{} model name is empty", self.provider.display_name()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("Temperature must be between 0.0 and 2.0".to_string());
        }

        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("timeout_seconds must be greater than 0".to_string());
        }

        if self.max_tables == 0 {
            return Err("max_tables must be greater than 0".to_string());
        }

        if self.top_k == 0 {
            return Err("top_k must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AiSqlConfig::default();
        assert_eq!(config.provider, AiProviderType::OpenAI);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.model(), "gpt-3.5-turbo");
        assert!(!config.include_sample_data);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = AiSqlConfig::default();

        config.temperature = 3.0;
        assert!(config.validate().is_err());

        config.temperature = 0.5;
        assert!(config.validate().is_ok());

        config.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_model_follows_provider() {
        let mut config = AiSqlConfig {
            provider: AiProviderType::Anthropic,
            ..AiSqlConfig::default()
        };
        config.set_model("claude-haiku".to_string());
        assert_eq!(config.anthropic_model, "claude-haiku");
        assert_eq!(config.openai_model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<AiProviderType>(), Ok(AiProviderType::OpenAI));
        assert_eq!("anthropic".parse::<AiProviderType>(), Ok(AiProviderType::Anthropic));
        assert!("ollama".parse::<AiProviderType>().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let parsed: AiSqlConfig = toml::from_str("provider = \"anthropic\"\ntemperature = 0.2\n").unwrap();
        assert_eq!(parsed.provider, AiProviderType::Anthropic);
        assert_eq!(parsed.temperature, 0.2);
        assert_eq!(parsed.top_k, 5);
    }
}
