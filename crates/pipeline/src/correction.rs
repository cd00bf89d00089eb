//! Final correction generation
//!
//! Fills the fixed instructional template with the re-ranked reference
//! context and the student essay, and asks the correction model for the
//! detailed analysis. Unlike HyDE and re-ranking there is no meaningful
//! fallback for the final answer, so failures propagate to the
//! orchestrator.

use std::sync::Arc;

use corretor_core::CompletionModel;

/// Correction prompt with `{contexto}` and `{redacao}` slots
const CORRECTION_TEMPLATE: &str = "\
Você é um corretor de redações do ENEM extremamente competente. Sua tarefa é fornecer uma análise detalhada e construtiva da redação a seguir, baseando-se nos materiais de referência fornecidos.

**Instruções:**
1. Analise a redação do aluno em relação às cinco competências do ENEM.
2. Use os \"Materiais de Referência\" para embasar sua correção, citando exemplos de boas práticas ou erros comuns.
3. Não forneça notas, seu objetivo é apenas indicar os erros e sugerir melhorias.
4. Finalize com um parágrafo de feedback geral e sugestões de melhoria.

**Materiais de Referência:**
---
{contexto}
---

**Redação do Aluno:**
---
{redacao}
---

**Análise Detalhada e Correção:**";

/// Final correction generator
pub struct CorrectionGenerator {
    llm: Arc<dyn CompletionModel>,
}

impl CorrectionGenerator {
    pub fn new(llm: Arc<dyn CompletionModel>) -> Self {
        Self { llm }
    }

    /// Fill the correction template. Deterministic: identical inputs
    /// produce identical prompts.
    pub fn build_prompt(context: &str, essay: &str) -> String {
        CORRECTION_TEMPLATE
            .replace("{contexto}", context)
            .replace("{redacao}", essay)
    }

    /// Generate the final correction. Errors propagate: there is no
    /// degraded substitute for the answer itself.
    pub async fn generate(&self, context: &str, essay: &str) -> corretor_core::Result<String> {
        let prompt = Self::build_prompt(context, essay);
        tracing::info!(model = self.llm.model_name(), "generating final correction");
        self.llm.complete(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FailingLlm;

    #[async_trait]
    impl CompletionModel for FailingLlm {
        async fn complete(&self, _prompt: &str) -> corretor_core::Result<String> {
            Err(corretor_core::Error::Llm("timeout".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_build_prompt_fills_both_slots() {
        let prompt = CorrectionGenerator::build_prompt("material de apoio", "texto do aluno");
        assert!(prompt.contains("material de apoio"));
        assert!(prompt.contains("texto do aluno"));
        assert!(prompt.contains("cinco competências"));
        assert!(prompt.contains("Análise Detalhada e Correção:"));
        assert!(!prompt.contains("{contexto}"));
        assert!(!prompt.contains("{redacao}"));
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let a = CorrectionGenerator::build_prompt("ctx", "redação");
        let b = CorrectionGenerator::build_prompt("ctx", "redação");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let generator = CorrectionGenerator::new(Arc::new(FailingLlm));
        let err = generator.generate("ctx", "redação").await.unwrap_err();
        assert!(matches!(err, corretor_core::Error::Llm(_)));
    }
}
