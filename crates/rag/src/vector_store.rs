//! File-persisted local vector index
//!
//! Passages and their embeddings live in a single JSON file under the
//! configured directory. The whole index is held in memory; searches are
//! a cosine-similarity scan. The correction pipeline only reads from the
//! index; `upsert` exists for the offline indexing path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use corretor_core::{Passage, PassageStore};

use crate::RagError;

const INDEX_FILE: &str = "passages.json";

/// One indexed passage with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedPassage {
    #[serde(flatten)]
    passage: Passage,
    embedding: Vec<f32>,
}

/// Local vector store persisted as JSON on disk
pub struct LocalVectorStore {
    dir: PathBuf,
    entries: RwLock<Vec<IndexedPassage>>,
}

impl LocalVectorStore {
    /// Open the index at `dir`, loading any persisted passages.
    ///
    /// A missing index file is not an error: the store starts empty and
    /// retrieval simply finds nothing until the corpus is indexed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, RagError> {
        let dir = dir.as_ref().to_path_buf();
        let index_path = dir.join(INDEX_FILE);

        let entries = if index_path.exists() {
            let data = std::fs::read_to_string(&index_path)
                .map_err(|e| RagError::VectorStore(format!("failed to read index: {}", e)))?;
            let entries: Vec<IndexedPassage> = serde_json::from_str(&data)
                .map_err(|e| RagError::VectorStore(format!("failed to parse index: {}", e)))?;
            tracing::info!(path = %index_path.display(), passages = entries.len(), "vector index loaded");
            entries
        } else {
            tracing::warn!(path = %index_path.display(), "no persisted index found, starting empty");
            Vec::new()
        };

        Ok(Self {
            dir,
            entries: RwLock::new(entries),
        })
    }

    /// Persist the current index contents to disk.
    ///
    /// Writes to a temp file first and renames into place, so a crash
    /// mid-write never corrupts the existing index.
    fn persist(&self, entries: &[IndexedPassage]) -> Result<(), RagError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| RagError::VectorStore(format!("failed to create index dir: {}", e)))?;

        let data = serde_json::to_string(entries)
            .map_err(|e| RagError::VectorStore(format!("failed to serialize index: {}", e)))?;

        let tmp = self.dir.join(format!("{}.tmp", INDEX_FILE));
        let path = self.dir.join(INDEX_FILE);
        std::fs::write(&tmp, data)
            .map_err(|e| RagError::VectorStore(format!("failed to write index: {}", e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| RagError::VectorStore(format!("failed to replace index: {}", e)))?;

        Ok(())
    }
}

/// Cosine similarity between two vectors; 0.0 when either has zero norm
/// or the dimensions disagree.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl PassageStore for LocalVectorStore {
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> corretor_core::Result<Vec<Passage>> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &IndexedPassage)> = entries
            .iter()
            .map(|entry| (cosine_similarity(query_embedding, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, entry)| entry.passage.clone())
            .collect())
    }

    async fn upsert(
        &self,
        passages: &[Passage],
        embeddings: &[Vec<f32>],
    ) -> corretor_core::Result<()> {
        if passages.len() != embeddings.len() {
            return Err(RagError::VectorStore(
                "passage and embedding count mismatch".to_string(),
            )
            .into());
        }

        let mut entries = self.entries.write();

        // Replace existing entries by id, append new ones
        let mut by_id: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.passage.id.clone(), i))
            .collect();

        for (passage, embedding) in passages.iter().zip(embeddings.iter()) {
            let entry = IndexedPassage {
                passage: passage.clone(),
                embedding: embedding.clone(),
            };
            match by_id.get(&passage.id) {
                Some(&i) => entries[i] = entry,
                None => {
                    by_id.insert(passage.id.clone(), entries.len());
                    entries.push(entry);
                },
            }
        }

        self.persist(&entries)?;
        tracing::info!(total = entries.len(), added = passages.len(), "index updated");
        Ok(())
    }

    async fn count(&self) -> corretor_core::Result<usize> {
        Ok(self.entries.read().len())
    }
}
