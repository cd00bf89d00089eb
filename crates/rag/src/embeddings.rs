//! Remote embedding client
//!
//! Calls the OpenAI embeddings API (also the embedding model used when the
//! reference corpus was indexed, so query and passage vectors live in the
//! same space).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use corretor_config::EmbeddingSettings;
use corretor_core::Embedder;

use crate::RagError;

/// Embedding client configuration
#[derive(Debug, Clone)]
pub struct EmbeddingClientConfig {
    /// API endpoint base, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Embedding dimension
    pub dim: usize,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for EmbeddingClientConfig {
    fn default() -> Self {
        use corretor_config::constants::{endpoints, models};
        Self {
            endpoint: endpoints::OPENAI_API.to_string(),
            api_key: String::new(),
            model: models::EMBEDDING.to_string(),
            dim: models::EMBEDDING_DIM,
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&EmbeddingSettings> for EmbeddingClientConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            dim: settings.dim,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// OpenAI embeddings client
pub struct OpenAiEmbedder {
    client: Client,
    config: EmbeddingClientConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: EmbeddingClientConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Embedding(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn embed_raw(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbedRequest {
            model: self.config.model.clone(),
            input: text.to_string(),
        };

        let url = format!("{}/embeddings", self.config.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "embedding request failed: {} - {}",
                status, text
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("failed to parse response: {}", e)))?;

        embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::Embedding("no embedding returned".to_string()))
    }

    /// Embed multiple texts sequentially (used by the indexing path).
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_raw(text).await?);
        }
        Ok(embeddings)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> corretor_core::Result<Vec<f32>> {
        Ok(self.embed_raw(text).await?)
    }

    fn dim(&self) -> usize {
        self.config.dim
    }
}
