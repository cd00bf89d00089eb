//! Trait seams for pluggable backends
//!
//! All external collaborators of the pipeline sit behind these traits so
//! implementations can be swapped without code changes and tests can run
//! against deterministic mocks:
//! - `CompletionModel`: prompt -> completion text
//! - `Embedder`: text -> dense vector
//! - `PassageStore`: nearest-neighbour search over indexed passages
//! - `CrossEncoder`: joint (query, passage) relevance scoring

use async_trait::async_trait;

use crate::error::Result;
use crate::passage::Passage;

/// A remote text-generation model.
///
/// Implementations normalize the provider's response shape down to plain
/// text before returning, so downstream components never see structured
/// response objects.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Text embedding model
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a dense vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimension.
    fn dim(&self) -> usize;
}

/// Persistent index of reference passages.
///
/// The correction pipeline only reads from the store; `upsert` exists for
/// the offline indexing path.
#[async_trait]
pub trait PassageStore: Send + Sync {
    /// Return the `top_k` passages nearest to the query embedding,
    /// most similar first. An empty result is a valid outcome, not an
    /// error.
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<Passage>>;

    /// Insert or replace passages together with their embeddings.
    async fn upsert(&self, passages: &[Passage], embeddings: &[Vec<f32>]) -> Result<()>;

    /// Number of indexed passages.
    async fn count(&self) -> Result<usize>;
}

/// Joint (query, passage) relevance scorer.
///
/// More accurate but more expensive than embedding similarity; used to
/// re-rank the initial candidate set.
pub trait CrossEncoder: Send + Sync {
    /// Score each (query, passage text) pair. The output preserves input
    /// order and length; higher scores mean more relevant.
    fn score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>>;
}
