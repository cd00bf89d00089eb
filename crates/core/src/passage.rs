//! Reference passage types
//!
//! A passage is one unit of previously indexed reference material (a chunk
//! of a correction guide, an exemplar essay, ...). The vector index owns
//! the passages; the pipeline only holds transient copies per request.

use serde::{Deserialize, Serialize};

/// Metadata attached to every indexed passage.
///
/// Field names match what the indexing side writes, so passages round-trip
/// through the persisted index unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// Path of the source document
    #[serde(default)]
    pub source: String,
    /// File name of the source document
    #[serde(default)]
    pub filename: String,
    /// Position of this chunk among its siblings
    #[serde(default)]
    pub chunk_index: usize,
    /// Total number of chunks produced from the source document
    #[serde(default)]
    pub total_chunks: usize,
    /// Document type tag, e.g. "redacao_material"
    #[serde(default, rename = "type")]
    pub doc_type: String,
}

/// A unit of indexed reference material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Stable chunk identifier, e.g. "manual_enem_3"
    pub id: String,
    /// Textual content of the chunk
    pub content: String,
    /// Source metadata
    #[serde(default)]
    pub metadata: PassageMetadata,
}

impl Passage {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: PassageMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: PassageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the passage carries any scoreable content.
    ///
    /// Whitespace-only passages are treated the same as empty ones; they
    /// are dropped before re-ranking, never scored.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// A passage paired with a relevance score (higher = more relevant).
///
/// Only exists during the re-ranking step; scores are discarded from the
/// re-ranker output.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_content() {
        assert!(Passage::new("a", "texto").has_content());
        assert!(!Passage::new("b", "").has_content());
        assert!(!Passage::new("c", "   \n\t ").has_content());
    }

    #[test]
    fn test_metadata_roundtrip() {
        let passage = Passage::new("manual_0", "conteúdo").with_metadata(PassageMetadata {
            source: "data/processed/manual.md".to_string(),
            filename: "manual.md".to_string(),
            chunk_index: 0,
            total_chunks: 12,
            doc_type: "redacao_material".to_string(),
        });

        let json = serde_json::to_string(&passage).unwrap();
        assert!(json.contains("\"type\":\"redacao_material\""));

        let back: Passage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, passage);
    }
}
