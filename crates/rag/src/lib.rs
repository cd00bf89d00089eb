//! Retrieval side of the essay correction pipeline
//!
//! Features:
//! - Remote embedding client (OpenAI embeddings API)
//! - File-persisted local vector index with cosine similarity search
//! - Dense retriever (fixed candidate pool)
//! - Cross-encoder re-ranker with a full fallback ladder
//! - Optional ONNX cross-encoder inference (`onnx` feature), keyword
//!   overlap scoring otherwise

pub mod embeddings;
pub mod reranker;
pub mod retriever;
pub mod vector_store;

pub use embeddings::{EmbeddingClientConfig, OpenAiEmbedder};
pub use reranker::{FallbackReason, RerankOutcome, Reranker, RerankerConfig, SimpleScorer};
pub use retriever::{Retriever, RetrieverConfig};
pub use vector_store::LocalVectorStore;

#[cfg(feature = "onnx")]
pub use reranker::OnnxCrossEncoder;

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Model error: {0}")]
    Model(String),
}

impl From<RagError> for corretor_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Embedding(msg) => corretor_core::Error::Embedding(msg),
            RagError::VectorStore(msg) | RagError::Search(msg) => {
                corretor_core::Error::VectorStore(msg)
            },
            RagError::Model(msg) => corretor_core::Error::Scoring(msg),
        }
    }
}
