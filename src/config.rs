use crate::ai_sql::AiSqlConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[default]
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default = "default_console_output")]
    pub console_output: bool,
    #[serde(default = "default_file_output")]
    pub file_output: bool,
    /// Log file name, relative to the config directory unless absolute
    #[serde(default = "default_log_file_path")]
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            console_output: default_console_output(),
            file_output: default_file_output(),
            file_path: default_log_file_path(),
        }
    }
}

/// Settings for the job-parameter summary path
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ChatConfig {
    /// Table holding one row of parameters per job
    pub table: String,
    /// Key column matched against the job name; never reported
    pub key_column: String,
    /// Input containing this phrase is a parameter-summary request
    pub trigger_phrase: String,
    /// Input containing this marker restricts output to `awi_prefix` columns.
    /// The summary header reads `AWI Parameters` whatever the marker is.
    pub awi_marker: String,
    pub awi_prefix: String,
    /// Cache column lists between requests instead of reading the catalog every time
    pub cache_columns: bool,
    pub column_cache_ttl_seconds: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            table: "substrata_api_jobparameters".to_string(),
            key_column: "job_name".to_string(),
            trigger_phrase: "Summarize the parameters for the job named".to_string(),
            awi_marker: "AWI".to_string(),
            awi_prefix: "awi_".to_string(),
            cache_columns: false,
            column_cache_ttl_seconds: 300,
        }
    }
}

impl ChatConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.table.trim().is_empty() {
            return Err("chat.table must not be empty".to_string());
        }
        if self.key_column.trim().is_empty() {
            return Err("chat.key_column must not be empty".to_string());
        }
        if self.trigger_phrase.trim().is_empty() {
            return Err("chat.trigger_phrase must not be empty".to_string());
        }
        if self.awi_marker.is_empty() {
            return Err("chat.awi_marker must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub ai_sql: AiSqlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            chat: ChatConfig::default(),
            ai_sql: AiSqlConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://substrata_interview.sqlite3".to_string()
}

fn default_console_output() -> bool {
    false
}

fn default_file_output() -> bool {
    true
}

fn default_log_file_path() -> String {
    "dbchat.log".to_string()
}

impl Config {
    /// Get the configuration directory path, creating it if needed
    pub fn get_config_directory() -> Result<PathBuf, Box<dyn Error>> {
        let config_dir = dirs::config_dir()
            .map(|dir| dir.join("dbchat"))
            .ok_or("Failed to get configuration directory")?;
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }
        Ok(config_dir)
    }

    /// Path of the default config file
    pub fn default_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::get_config_directory()?.join(CONFIG_FILE_NAME))
    }

    /// Path of the line-editor history file
    pub fn history_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::get_config_directory()?.join("history.txt"))
    }

    /// Resolve the log file location against the config directory
    pub fn log_file_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        let path = Path::new(&self.logging.file_path);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(Self::get_config_directory()?.join(path))
        }
    }

    /// Load the default config file, writing one with defaults on first run
    pub fn load() -> Result<Self, Box<dyn Error>> {
        let path = Self::default_path()?;
        if !path.exists() {
            let config = Config::default();
            if let Err(e) = config.save_to(&path) {
                eprintln!("Warning: could not write default config to {}: {e}", path.display());
            }
            return Ok(config);
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path; a missing file is an error here
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        Self::parse(&content).map_err(|e| format!("invalid config {}: {e}", path.display()).into())
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.trim().is_empty() {
            return Err("database_url must not be empty".to_string());
        }
        self.chat.validate()?;
        self.ai_sql.validate()
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        let body = toml::to_string(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let content = format!(
            "# dbchat configuration\n# API keys are never stored here: set OPENAI_API_KEY / ANTHROPIC_API_KEY or enter the key at startup.\n\n{body}"
        );
        fs::write(path, content)
    }
}
