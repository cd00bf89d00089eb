//! Dense retriever
//!
//! Embeds the query and fetches a fixed candidate pool from the vector
//! index. One embedding plus one search per invocation, no retries; an
//! empty result set is a valid outcome the orchestrator handles.

use std::sync::Arc;

use corretor_config::constants::rag;
use corretor_core::{Embedder, Passage, PassageStore};

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Number of candidates fetched from the index
    pub candidate_pool_k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            candidate_pool_k: rag::CANDIDATE_POOL_K,
        }
    }
}

impl From<&corretor_config::RagSettings> for RetrieverConfig {
    fn from(settings: &corretor_config::RagSettings) -> Self {
        Self {
            candidate_pool_k: settings.candidate_pool_k,
        }
    }
}

/// Dense retriever over the persisted passage index
pub struct Retriever {
    config: RetrieverConfig,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn PassageStore>,
}

impl Retriever {
    pub fn new(
        config: RetrieverConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn PassageStore>,
    ) -> Self {
        Self {
            config,
            embedder,
            store,
        }
    }

    /// Fetch the initial candidate set for a query.
    pub async fn retrieve(&self, query: &str) -> corretor_core::Result<Vec<Passage>> {
        let embedding = self.embedder.embed(query).await?;
        let passages = self
            .store
            .search(&embedding, self.config.candidate_pool_k)
            .await?;

        tracing::info!(
            candidates = passages.len(),
            top_k = self.config.candidate_pool_k,
            "initial retrieval done"
        );
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> corretor_core::Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dim(&self) -> usize {
            2
        }
    }

    struct RecordingStore {
        passages: Vec<Passage>,
        seen_top_k: std::sync::Mutex<Option<usize>>,
    }

    #[async_trait]
    impl PassageStore for RecordingStore {
        async fn search(
            &self,
            _query_embedding: &[f32],
            top_k: usize,
        ) -> corretor_core::Result<Vec<Passage>> {
            *self.seen_top_k.lock().unwrap() = Some(top_k);
            Ok(self.passages.clone())
        }

        async fn upsert(
            &self,
            _passages: &[Passage],
            _embeddings: &[Vec<f32>],
        ) -> corretor_core::Result<()> {
            unimplemented!("read-only store")
        }

        async fn count(&self) -> corretor_core::Result<usize> {
            Ok(self.passages.len())
        }
    }

    #[tokio::test]
    async fn test_retrieve_uses_configured_pool_size() {
        let store = Arc::new(RecordingStore {
            passages: vec![Passage::new("a", "texto")],
            seen_top_k: std::sync::Mutex::new(None),
        });
        let retriever = Retriever::new(
            RetrieverConfig::default(),
            Arc::new(FixedEmbedder),
            store.clone(),
        );

        let results = retriever.retrieve("consulta").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(*store.seen_top_k.lock().unwrap(), Some(20));
    }

    #[tokio::test]
    async fn test_retrieve_empty_index_is_not_an_error() {
        let store = Arc::new(RecordingStore {
            passages: Vec::new(),
            seen_top_k: std::sync::Mutex::new(None),
        });
        let retriever = Retriever::new(
            RetrieverConfig::default(),
            Arc::new(FixedEmbedder),
            store,
        );

        let results = retriever.retrieve("consulta").await.unwrap();
        assert!(results.is_empty());
    }
}
