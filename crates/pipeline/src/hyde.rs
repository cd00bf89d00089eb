//! Hypothetical document generation (HyDE)
//!
//! Generates a short analytical paragraph from the essay and uses it as
//! the retrieval query instead of the raw essay text. A generated
//! analysis sits much closer in embedding space to correction guides and
//! exemplar material than a student essay does.

use std::sync::Arc;

use corretor_config::constants::hyde;
use corretor_core::CompletionModel;

/// Prompt for the hypothetical analysis, with a `{redacao}` slot
const HYDE_TEMPLATE: &str = "\
Você é um assistente especialista em redações do ENEM.
Com base na redação abaixo, gere um parágrafo de análise que capture os temas centrais,
os argumentos principais e a proposta de intervenção. Este parágrafo será usado para encontrar
exemplos e guias de correção relevantes.

Redação:
---
{redacao}
---

Análise Hipotética:";

/// Result of a HyDE pass.
///
/// The fallback branch is explicit so callers can tell whether the query
/// came from the model or from the degraded essay-prefix path.
#[derive(Debug, Clone, PartialEq)]
pub enum HydeOutcome {
    /// The model produced an analysis
    Generated(String),
    /// The model call failed; the query is a prefix of the raw essay
    Fallback(String),
}

impl HydeOutcome {
    pub fn query(&self) -> &str {
        match self {
            HydeOutcome::Generated(query) => query,
            HydeOutcome::Fallback(query) => query,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, HydeOutcome::Fallback(_))
    }
}

/// Hypothetical document generator
pub struct HydeGenerator {
    llm: Arc<dyn CompletionModel>,
    fallback_chars: usize,
}

impl HydeGenerator {
    pub fn new(llm: Arc<dyn CompletionModel>) -> Self {
        Self {
            llm,
            fallback_chars: hyde::FALLBACK_CHARS,
        }
    }

    /// Generate the retrieval query for an essay.
    ///
    /// Never fails: any LLM error is logged and replaced by the first
    /// 500 characters of the essay, so the pipeline can always proceed
    /// to retrieval.
    pub async fn generate(&self, essay: &str) -> HydeOutcome {
        let prompt = HYDE_TEMPLATE.replace("{redacao}", essay);

        tracing::info!(model = self.llm.model_name(), "generating hypothetical document");
        match self.llm.complete(&prompt).await {
            Ok(analysis) => HydeOutcome::Generated(analysis),
            Err(err) => {
                tracing::error!(error = %err, "hypothetical document generation failed, using essay prefix");
                HydeOutcome::Fallback(truncate_chars(essay, self.fallback_chars).to_string())
            },
        }
    }
}

/// Truncate to at most `max_chars` characters, respecting char
/// boundaries (a byte slice would panic on multi-byte UTF-8).
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoLlm;

    #[async_trait]
    impl CompletionModel for EchoLlm {
        async fn complete(&self, prompt: &str) -> corretor_core::Result<String> {
            Ok(format!("análise de: {}", prompt.len()))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl CompletionModel for FailingLlm {
        async fn complete(&self, _prompt: &str) -> corretor_core::Result<String> {
            Err(corretor_core::Error::Llm("connection refused".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_success_returns_model_output() {
        let generator = HydeGenerator::new(Arc::new(EchoLlm));
        let outcome = generator.generate("uma redação").await;
        assert!(!outcome.is_fallback());
        assert!(outcome.query().starts_with("análise de:"));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_essay_prefix() {
        let generator = HydeGenerator::new(Arc::new(FailingLlm));

        let short = "redação curta";
        let outcome = generator.generate(short).await;
        assert_eq!(outcome, HydeOutcome::Fallback(short.to_string()));

        let long = "x".repeat(1200);
        let outcome = generator.generate(&long).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.query().chars().count(), 500);
    }

    #[tokio::test]
    async fn test_fallback_respects_utf8_boundaries() {
        let generator = HydeGenerator::new(Arc::new(FailingLlm));
        // 600 multi-byte chars; a byte-indexed cut would panic
        let essay = "ã".repeat(600);
        let outcome = generator.generate(&essay).await;
        assert_eq!(outcome.query().chars().count(), 500);
    }

    #[tokio::test]
    async fn test_empty_essay_does_not_crash() {
        let generator = HydeGenerator::new(Arc::new(FailingLlm));
        let outcome = generator.generate("").await;
        assert_eq!(outcome.query(), "");
    }

    #[test]
    fn test_prompt_embeds_essay() {
        let prompt = HYDE_TEMPLATE.replace("{redacao}", "minha redação");
        assert!(prompt.contains("minha redação"));
        assert!(prompt.contains("Análise Hipotética:"));
        assert!(!prompt.contains("{redacao}"));
    }
}
