//! LLM integration
//!
//! A single OpenAI-compatible chat backend covers both providers used by
//! the correction pipeline: OpenAI for hypothetical document generation
//! and Maritaca AI (sabia-3) for the final correction, which exposes the
//! same chat completions API under a different base URL.
//!
//! Response normalization happens here: whatever shape the provider
//! returns (plain string content or an array of content parts), callers
//! only ever see plain text.

pub mod backend;

pub use backend::{ChatBackend, ChatConfig};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for corretor_core::Error {
    fn from(err: LlmError) -> Self {
        corretor_core::Error::Llm(err.to_string())
    }
}
