//! Configuration management for the essay correction service
//!
//! Supports loading configuration from:
//! - TOML files
//! - Environment variables (`CORRETOR_` prefix, `__` section separator)
//! - Standard credential variables (`OPENAI_API_KEY`, `MARITACA_API_KEY`)
//!
//! All tunables shared across crates live in [`constants`] so defaults
//! stay consistent between the settings layer and component configs.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, EmbeddingSettings, IndexSettings, LlmProviderSettings, RagSettings,
    ServerSettings, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
