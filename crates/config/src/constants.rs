//! Centralized constants
//!
//! Component configs derive their defaults from here so the retrieval and
//! generation stages stay in sync with the settings layer.

/// Retrieval and re-ranking tunables
pub mod rag {
    /// Candidates fetched from the vector index per query
    pub const CANDIDATE_POOL_K: usize = 20;

    /// Passages kept after cross-encoder re-ranking
    pub const RERANK_TOP_N: usize = 5;

    /// Separator between passages in the generation context
    pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";
}

/// HyDE (hypothetical document) tunables
pub mod hyde {
    /// Characters of the raw essay used as the degraded search query when
    /// hypothetical document generation fails
    pub const FALLBACK_CHARS: usize = 500;

    /// HyDE generation is deterministic
    pub const TEMPERATURE: f32 = 0.0;

    pub const MAX_TOKENS: usize = 512;
}

/// Final correction generation tunables
pub mod correction {
    pub const TEMPERATURE: f32 = 0.35;

    pub const MAX_TOKENS: usize = 2048;
}

/// Default remote endpoints
pub mod endpoints {
    pub const OPENAI_API: &str = "https://api.openai.com/v1";

    /// Maritaca AI exposes an OpenAI-compatible chat completions API
    pub const MARITACA_API: &str = "https://chat.maritaca.ai/api";
}

/// Default model identifiers
pub mod models {
    pub const HYDE: &str = "gpt-3.5-turbo";

    pub const CORRECTION: &str = "sabia-3";

    pub const EMBEDDING: &str = "text-embedding-ada-002";

    pub const EMBEDDING_DIM: usize = 1536;

    /// Cross-encoder used for passage re-ranking (exported to ONNX)
    pub const CROSS_ENCODER: &str = "amberoad/bert-multilingual-passage-reranking-msmarco";
}
