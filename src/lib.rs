pub mod ai_sql;
pub mod chat;
pub mod cli;
pub mod config;
pub mod database; // Database abstraction layer
pub mod database_postgresql; // PostgreSQL implementation
pub mod database_sqlite; // SQLite implementation
pub mod logging;
pub mod prompt;

pub use chat::{ChatBot, ChatError, ChatResult};
pub use config::Config;
