//! Cross-encoder re-ranker
//!
//! Reorders the retrieved candidate set by joint (query, passage)
//! relevance and truncates it to the top N. Re-ranking is a quality
//! optimization, never a point of failure: every error path degrades to
//! the original retrieval order instead of aborting the pipeline.
//!
//! Fallback ladder, in order:
//! 1. Empty input -> empty output (warned, not an error)
//! 2. `top_n` larger than the input -> clamped down, never padded
//! 3. Passages with empty/whitespace content are dropped before scoring
//! 4. Nothing left after filtering -> first `top_n` of the original list
//! 5. Scoring fails -> first `top_n` of the original list, unscored
//!
//! Scoring runs through the [`CrossEncoder`] trait: an ONNX model when
//! the `onnx` feature is enabled, keyword-overlap scoring otherwise.

use std::sync::Arc;

use corretor_config::constants::rag;
use corretor_core::{CrossEncoder, Passage, ScoredPassage};

#[cfg(feature = "onnx")]
use crate::RagError;

/// Re-ranker configuration
#[derive(Debug, Clone)]
pub struct RerankerConfig {
    /// Passages kept after re-ranking
    pub top_n: usize,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            top_n: rag::RERANK_TOP_N,
        }
    }
}

impl From<&corretor_config::RagSettings> for RerankerConfig {
    fn from(settings: &corretor_config::RagSettings) -> Self {
        Self {
            top_n: settings.rerank_top_n,
        }
    }
}

/// Why the re-ranker fell back to retrieval order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Every candidate had empty or whitespace-only content
    NoValidContent,
    /// The cross-encoder failed to score the candidates
    ScoringFailed,
}

/// Result of a re-ranking pass.
///
/// The fallback branch is explicit so callers (and tests) can tell which
/// path produced the output instead of inferring it from its shape.
#[derive(Debug, Clone)]
pub enum RerankOutcome {
    /// Candidates were scored and reordered
    Reranked(Vec<Passage>),
    /// Scoring was skipped or failed; passages are the first `top_n` of
    /// the original input, in retrieval order
    Fallback {
        passages: Vec<Passage>,
        reason: FallbackReason,
    },
}

impl RerankOutcome {
    pub fn passages(&self) -> &[Passage] {
        match self {
            RerankOutcome::Reranked(passages) => passages,
            RerankOutcome::Fallback { passages, .. } => passages,
        }
    }

    pub fn into_passages(self) -> Vec<Passage> {
        match self {
            RerankOutcome::Reranked(passages) => passages,
            RerankOutcome::Fallback { passages, .. } => passages,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RerankOutcome::Fallback { .. })
    }
}

/// Cross-encoder re-ranker
pub struct Reranker {
    config: RerankerConfig,
    scorer: Arc<dyn CrossEncoder>,
}

impl Reranker {
    pub fn new(config: RerankerConfig, scorer: Arc<dyn CrossEncoder>) -> Self {
        Self { config, scorer }
    }

    /// Re-rank with the configured `top_n`.
    pub fn rerank(&self, query: &str, passages: &[Passage]) -> RerankOutcome {
        self.rerank_top_n(query, passages, self.config.top_n)
    }

    /// Re-rank and keep the best `top_n` passages.
    ///
    /// Never errors: every failure degrades to the original retrieval
    /// order (see module docs for the full ladder).
    pub fn rerank_top_n(&self, query: &str, passages: &[Passage], top_n: usize) -> RerankOutcome {
        if passages.is_empty() {
            tracing::warn!("no candidates to re-rank");
            return RerankOutcome::Reranked(Vec::new());
        }

        let top_n = if passages.len() < top_n {
            tracing::info!(
                top_n = passages.len(),
                requested = top_n,
                "clamping top_n to candidate count"
            );
            passages.len()
        } else {
            top_n
        };

        // Drop empty passages before any model call; scoring empty content
        // is meaningless and wasteful.
        let valid: Vec<&Passage> = passages
            .iter()
            .filter(|p| {
                if p.has_content() {
                    true
                } else {
                    tracing::warn!(id = %p.id, "dropping passage without content");
                    false
                }
            })
            .collect();

        if valid.is_empty() {
            tracing::warn!("no valid candidates after content filtering, using retrieval order");
            return RerankOutcome::Fallback {
                passages: passages.iter().take(top_n).cloned().collect(),
                reason: FallbackReason::NoValidContent,
            };
        }

        let pairs: Vec<(String, String)> = valid
            .iter()
            .map(|p| (query.to_string(), p.content.clone()))
            .collect();

        let scores = match self.scorer.score(&pairs) {
            Ok(scores) if scores.len() == valid.len() => scores,
            Ok(scores) => {
                tracing::error!(
                    expected = valid.len(),
                    got = scores.len(),
                    "cross-encoder returned wrong score count, using retrieval order"
                );
                return self.fallback(passages, top_n);
            },
            Err(err) => {
                tracing::error!(error = %err, "cross-encoder scoring failed, using retrieval order");
                return self.fallback(passages, top_n);
            },
        };

        let mut scored: Vec<ScoredPassage> = valid
            .into_iter()
            .zip(scores)
            .map(|(passage, score)| ScoredPassage {
                passage: passage.clone(),
                score,
            })
            .collect();

        // Stable sort: ties keep their original retrieval order, so the
        // output is deterministic.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let reranked: Vec<Passage> = scored
            .into_iter()
            .take(top_n)
            .map(|sp| sp.passage)
            .collect();

        tracing::info!(kept = reranked.len(), "re-ranking done");
        RerankOutcome::Reranked(reranked)
    }

    fn fallback(&self, passages: &[Passage], top_n: usize) -> RerankOutcome {
        RerankOutcome::Fallback {
            passages: passages.iter().take(top_n).cloned().collect(),
            reason: FallbackReason::ScoringFailed,
        }
    }
}

/// Keyword-overlap scorer used when no cross-encoder model is loaded.
///
/// TF-IDF-like weighting: term frequency with diminishing returns, word
/// length as an IDF approximation, stopword filtering and a coverage
/// bonus for documents matching more query terms.
pub struct SimpleScorer;

impl SimpleScorer {
    /// Common stopwords for Portuguese and English
    const STOPWORDS: &'static [&'static str] = &[
        // Portuguese
        "o", "a", "os", "as", "um", "uma", "uns", "umas", "de", "do", "da", "dos", "das", "em",
        "no", "na", "nos", "nas", "por", "para", "com", "sem", "sob", "sobre", "que", "quem",
        "qual", "quais", "quando", "onde", "como", "e", "ou", "mas", "se", "não", "sim", "é",
        "são", "foi", "ser", "está", "estão", "ao", "aos", "à", "às", "pelo", "pela", "pelos",
        "pelas", "este", "esta", "isto", "esse", "essa", "isso", "aquele", "aquela", "aquilo",
        "seu", "sua", "seus", "suas", "meu", "minha", "ele", "ela", "eles", "elas", "nós", "já",
        "também", "muito", "mais", "menos", "há", "lhe",
        // English
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "to", "of", "in", "for",
        "on", "with", "at", "by", "from", "and", "or", "but", "if", "then", "this", "that",
        "these", "those", "it", "its", "not", "no", "so", "as",
    ];

    /// Score a single (query, document) pair in [0, 1].
    pub fn score(query: &str, document: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let doc_lower = document.to_lowercase();

        let stopwords: std::collections::HashSet<&str> = Self::STOPWORDS.iter().copied().collect();

        let query_terms: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|w| w.len() > 1 && !stopwords.contains(*w))
            .collect();

        if query_terms.is_empty() {
            return 0.0;
        }

        let doc_words: Vec<&str> = doc_lower.split_whitespace().collect();
        let doc_len = doc_words.len().max(1) as f32;

        let mut total_score = 0.0f32;
        let mut matched_terms = 0usize;

        for (pos, term) in query_terms.iter().enumerate() {
            let tf = doc_words.iter().filter(|w| **w == *term).count() as f32;

            if tf > 0.0 {
                matched_terms += 1;

                // sqrt for diminishing returns on repeated terms
                let tf_score = tf.sqrt();
                // longer words are more specific
                let idf_approx = (1.0 + term.len() as f32).ln();
                // earlier query terms slightly more important
                let position_weight = 1.0 / (1.0 + pos as f32 * 0.1);
                // mild length normalization, always positive
                let length_norm = 1.0 / (1.0 + (doc_len / 50.0).sqrt());

                total_score += tf_score * idf_approx * position_weight * length_norm;
            }
        }

        let coverage = matched_terms as f32 / query_terms.len() as f32;
        let raw_score = total_score + coverage * 0.3;
        (raw_score / (raw_score + 1.0)).min(1.0)
    }
}

impl CrossEncoder for SimpleScorer {
    fn score(&self, pairs: &[(String, String)]) -> corretor_core::Result<Vec<f32>> {
        Ok(pairs
            .iter()
            .map(|(query, document)| Self::score(query, document))
            .collect())
    }
}

/// ONNX cross-encoder
///
/// Runs an exported passage re-ranking model (e.g.
/// `amberoad/bert-multilingual-passage-reranking-msmarco`) through ONNX
/// Runtime. Available with the `onnx` feature.
#[cfg(feature = "onnx")]
pub struct OnnxCrossEncoder {
    session: parking_lot::Mutex<ort::session::Session>,
    tokenizer: tokenizers::Tokenizer,
    max_seq_len: usize,
}

#[cfg(feature = "onnx")]
impl OnnxCrossEncoder {
    pub fn new(
        model_path: impl AsRef<std::path::Path>,
        tokenizer_path: impl AsRef<std::path::Path>,
    ) -> Result<Self, RagError> {
        use ort::session::builder::GraphOptimizationLevel;
        use ort::session::Session;

        let session = Session::builder()
            .map_err(|e| RagError::Model(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RagError::Model(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| RagError::Model(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| RagError::Model(e.to_string()))?;

        let tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path)
            .map_err(|e| RagError::Model(e.to_string()))?;

        Ok(Self {
            session: parking_lot::Mutex::new(session),
            tokenizer,
            max_seq_len: 256,
        })
    }

    fn score_pair(&self, query: &str, document: &str) -> Result<f32, RagError> {
        use ndarray::Array2;
        use ort::value::Tensor;

        let encoding = self
            .tokenizer
            .encode((query, document), true)
            .map_err(|e| RagError::Model(e.to_string()))?;

        let ids: Vec<i64> = encoding
            .get_ids()
            .iter()
            .take(self.max_seq_len)
            .map(|&id| id as i64)
            .collect();

        let mut padded_ids = vec![0i64; self.max_seq_len];
        let mut padded_mask = vec![0i64; self.max_seq_len];
        padded_ids[..ids.len()].copy_from_slice(&ids);
        for slot in padded_mask.iter_mut().take(ids.len()) {
            *slot = 1;
        }

        let input_ids = Array2::from_shape_vec((1, self.max_seq_len), padded_ids)
            .map_err(|e| RagError::Model(e.to_string()))?;
        let attention = Array2::from_shape_vec((1, self.max_seq_len), padded_mask)
            .map_err(|e| RagError::Model(e.to_string()))?;

        let input_ids_tensor =
            Tensor::from_array(input_ids).map_err(|e| RagError::Model(e.to_string()))?;
        let attention_tensor =
            Tensor::from_array(attention).map_err(|e| RagError::Model(e.to_string()))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_tensor,
            ])
            .map_err(|e| RagError::Model(e.to_string()))?;

        let (_, logits) = outputs
            .get("logits")
            .ok_or_else(|| RagError::Model("missing logits output".to_string()))?
            .try_extract_tensor::<f32>()
            .map_err(|e| RagError::Model(e.to_string()))?;

        Ok(Self::relevance_from_logits(logits))
    }

    /// Softmax probability of the "relevant" class for two-logit models,
    /// sigmoid for single-logit models.
    fn relevance_from_logits(logits: &[f32]) -> f32 {
        if logits.len() >= 2 {
            let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let exp_sum: f32 = logits.iter().map(|&x| (x - max).exp()).sum();
            (logits[1] - max).exp() / exp_sum
        } else if logits.len() == 1 {
            1.0 / (1.0 + (-logits[0]).exp())
        } else {
            0.0
        }
    }
}

#[cfg(feature = "onnx")]
impl CrossEncoder for OnnxCrossEncoder {
    fn score(&self, pairs: &[(String, String)]) -> corretor_core::Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(pairs.len());
        for (query, document) in pairs {
            scores.push(self.score_pair(query, document)?);
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores passages by a fixed table keyed on content
    struct TableScorer(Vec<f32>);

    impl CrossEncoder for TableScorer {
        fn score(&self, pairs: &[(String, String)]) -> corretor_core::Result<Vec<f32>> {
            Ok(self.0.iter().copied().take(pairs.len()).collect())
        }
    }

    struct FailingScorer;

    impl CrossEncoder for FailingScorer {
        fn score(&self, _pairs: &[(String, String)]) -> corretor_core::Result<Vec<f32>> {
            Err(corretor_core::Error::Scoring("model load failed".to_string()))
        }
    }

    fn passages(contents: &[&str]) -> Vec<Passage> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| Passage::new(format!("p{}", i), *c))
            .collect()
    }

    #[test]
    fn test_empty_input_returns_empty() {
        let reranker = Reranker::new(RerankerConfig::default(), Arc::new(SimpleScorer));
        let outcome = reranker.rerank("consulta", &[]);
        assert!(outcome.passages().is_empty());
        assert!(!outcome.is_fallback());
    }

    #[test]
    fn test_output_length_is_min_of_input_and_top_n() {
        let reranker = Reranker::new(RerankerConfig::default(), Arc::new(SimpleScorer));

        // Fewer candidates than top_n: clamp, never pad
        let candidates = passages(&["um texto", "outro texto", "mais texto"]);
        let outcome = reranker.rerank_top_n("texto", &candidates, 5);
        assert_eq!(outcome.passages().len(), 3);

        // More candidates than top_n: truncate
        let candidates = passages(&["a1 texto", "a2 texto", "a3 texto", "a4", "a5", "a6", "a7"]);
        let outcome = reranker.rerank_top_n("texto", &candidates, 5);
        assert_eq!(outcome.passages().len(), 5);
    }

    #[test]
    fn test_sorts_by_score_descending() {
        let candidates = passages(&["baixo", "alto", "medio"]);
        let reranker = Reranker::new(
            RerankerConfig::default(),
            Arc::new(TableScorer(vec![0.1, 0.9, 0.5])),
        );

        let outcome = reranker.rerank_top_n("consulta", &candidates, 3);
        let ids: Vec<&str> = outcome.passages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p0"]);
        assert!(!outcome.is_fallback());
    }

    #[test]
    fn test_ties_keep_retrieval_order() {
        let candidates = passages(&["primeiro", "segundo", "terceiro"]);
        let reranker = Reranker::new(
            RerankerConfig::default(),
            Arc::new(TableScorer(vec![0.5, 0.5, 0.5])),
        );

        let outcome = reranker.rerank_top_n("consulta", &candidates, 3);
        let ids: Vec<&str> = outcome.passages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn test_output_is_subsequence_of_filtered_input() {
        let candidates = passages(&["um", "", "dois", "   ", "tres"]);
        let reranker = Reranker::new(
            RerankerConfig::default(),
            Arc::new(TableScorer(vec![0.3, 0.2, 0.1])),
        );

        let outcome = reranker.rerank_top_n("consulta", &candidates, 5);
        // Empty passages were dropped before scoring; only valid ones appear
        let ids: Vec<&str> = outcome.passages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p2", "p4"]);
    }

    #[test]
    fn test_all_empty_content_falls_back_to_original_order() {
        let candidates = passages(&["", "  ", "\n", "", "", "", ""]);
        let reranker = Reranker::new(RerankerConfig::default(), Arc::new(SimpleScorer));

        let outcome = reranker.rerank_top_n("consulta", &candidates, 5);
        match &outcome {
            RerankOutcome::Fallback { passages, reason } => {
                assert_eq!(*reason, FallbackReason::NoValidContent);
                // First top_n of the ORIGINAL unfiltered list, not empty
                assert_eq!(passages.len(), 5);
                assert_eq!(passages[0].id, "p0");
            },
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_scoring_failure_falls_back_without_propagating() {
        let candidates = passages(&["um", "dois", "tres"]);
        let reranker = Reranker::new(RerankerConfig::default(), Arc::new(FailingScorer));

        let outcome = reranker.rerank_top_n("consulta", &candidates, 2);
        match &outcome {
            RerankOutcome::Fallback { passages, reason } => {
                assert_eq!(*reason, FallbackReason::ScoringFailed);
                let ids: Vec<&str> = passages.iter().map(|p| p.id.as_str()).collect();
                assert_eq!(ids, vec!["p0", "p1"]);
            },
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_score_count_falls_back() {
        let candidates = passages(&["um", "dois", "tres"]);
        // Only two scores for three candidates
        let reranker = Reranker::new(
            RerankerConfig::default(),
            Arc::new(TableScorer(vec![0.9, 0.1])),
        );

        let outcome = reranker.rerank_top_n("consulta", &candidates, 3);
        assert!(outcome.is_fallback());
    }

    #[test]
    fn test_simple_scorer_relevance() {
        let score_relevant = SimpleScorer::score(
            "desigualdade social brasil",
            "A desigualdade social no Brasil tem raízes históricas profundas",
        );
        let score_irrelevant = SimpleScorer::score(
            "desigualdade social brasil",
            "Receita de bolo de cenoura com cobertura de chocolate",
        );
        assert!(score_relevant > score_irrelevant);
        assert!(score_irrelevant >= 0.0);
    }

    #[test]
    fn test_simple_scorer_stopword_only_query() {
        assert_eq!(SimpleScorer::score("o a de", "qualquer texto"), 0.0);
    }
}
