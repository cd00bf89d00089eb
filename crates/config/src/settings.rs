//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{correction, endpoints, hyde, models, rag};
use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// LLM used to generate the hypothetical document (HyDE step)
    #[serde(default = "LlmProviderSettings::hyde_default")]
    pub hyde_llm: LlmProviderSettings,

    /// LLM used to generate the final correction
    #[serde(default = "LlmProviderSettings::correction_default")]
    pub correction_llm: LlmProviderSettings,

    /// Embedding model configuration
    #[serde(default)]
    pub embeddings: EmbeddingSettings,

    /// Persisted vector index configuration
    #[serde(default)]
    pub index: IndexSettings,

    /// Retrieval and re-ranking configuration
    #[serde(default)]
    pub rag: RagSettings,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means permissive (development only)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Settings for one OpenAI-compatible completion provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderSettings {
    /// API key. Falls back to the provider's standard environment variable
    /// when not set in the file.
    #[serde(default)]
    pub api_key: String,

    pub endpoint: String,

    pub model: String,

    pub temperature: f32,

    pub max_tokens: usize,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl LlmProviderSettings {
    fn hyde_default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            endpoint: endpoints::OPENAI_API.to_string(),
            model: models::HYDE.to_string(),
            temperature: hyde::TEMPERATURE,
            max_tokens: hyde::MAX_TOKENS,
            timeout_secs: default_llm_timeout_secs(),
        }
    }

    fn correction_default() -> Self {
        Self {
            api_key: std::env::var("MARITACA_API_KEY").unwrap_or_default(),
            endpoint: endpoints::MARITACA_API.to_string(),
            model: models::CORRECTION.to_string(),
            temperature: correction::TEMPERATURE,
            max_tokens: correction::MAX_TOKENS,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl Default for LlmProviderSettings {
    fn default() -> Self {
        Self::hyde_default()
    }
}

/// Embedding model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// API key; defaults to the OpenAI key (embeddings share the provider
    /// of the HyDE model)
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dim")]
    pub dim: usize,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_endpoint() -> String {
    endpoints::OPENAI_API.to_string()
}

fn default_embedding_model() -> String {
    models::EMBEDDING.to_string()
}

fn default_embedding_dim() -> usize {
    models::EMBEDDING_DIM
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            dim: default_embedding_dim(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Persisted vector index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Filesystem path of the persisted index
    #[serde(default = "default_index_path")]
    pub path: String,
}

fn default_index_path() -> String {
    std::env::var("CORRETOR_DB_PATH").unwrap_or_else(|_| "db".to_string())
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

/// Retrieval and re-ranking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSettings {
    /// Candidates fetched from the vector index
    #[serde(default = "default_candidate_pool_k")]
    pub candidate_pool_k: usize,

    /// Passages kept after re-ranking
    #[serde(default = "default_rerank_top_n")]
    pub rerank_top_n: usize,

    /// Optional path to an ONNX cross-encoder model (used with the `onnx`
    /// feature of corretor-rag)
    #[serde(default)]
    pub cross_encoder_model_path: Option<String>,

    /// Optional path to the cross-encoder tokenizer file
    #[serde(default)]
    pub cross_encoder_tokenizer_path: Option<String>,
}

fn default_candidate_pool_k() -> usize {
    rag::CANDIDATE_POOL_K
}

fn default_rerank_top_n() -> usize {
    rag::RERANK_TOP_N
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            candidate_pool_k: default_candidate_pool_k(),
            rerank_top_n: default_rerank_top_n(),
            cross_encoder_model_path: None,
            cross_encoder_tokenizer_path: None,
        }
    }
}

// Manual impl: a derive would give both providers the same
// `LlmProviderSettings::default()`, but each provider has its own
// defaults and the serde field attributes only apply on deserialization.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            hyde_llm: LlmProviderSettings::hyde_default(),
            correction_llm: LlmProviderSettings::correction_default(),
            embeddings: EmbeddingSettings::default(),
            index: IndexSettings::default(),
            rag: RagSettings::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings.
    ///
    /// Missing credentials are a hard precondition failure: the pipeline
    /// refuses to start without both provider keys.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hyde_llm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField(
                "hyde_llm.api_key (OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.correction_llm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField(
                "correction_llm.api_key (MARITACA_API_KEY)".to_string(),
            ));
        }
        if self.index.path.trim().is_empty() {
            return Err(ConfigError::MissingField("index.path".to_string()));
        }
        if self.rag.candidate_pool_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.candidate_pool_k".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.rag.rerank_top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.rerank_top_n".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from an optional TOML file plus environment overrides.
///
/// Environment variables use the `CORRETOR_` prefix with `__` as the
/// section separator, e.g. `CORRETOR_SERVER__PORT=9000`.
pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound(path.to_string()));
        }
        builder = builder.add_source(File::with_name(path));
    }

    let config = builder
        .add_source(Environment::with_prefix("CORRETOR").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    tracing::debug!(
        hyde_model = %settings.hyde_llm.model,
        correction_model = %settings.correction_llm.model,
        index_path = %settings.index.path,
        "settings loaded"
    );
    Ok(settings)
}
