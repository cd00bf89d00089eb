//! Shared error type
//!
//! Each crate defines its own error enum and converts into this one at the
//! crate boundary, so callers only ever handle a single type.

use thiserror::Error;

/// Top-level error for the essay correction service
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, Error>;
