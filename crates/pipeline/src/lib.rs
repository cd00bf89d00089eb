//! Essay correction pipeline
//!
//! Sequences the full RAG flow for one essay:
//! essay -> hypothetical document (HyDE) -> candidate passages ->
//! re-ranked passages -> context bundle -> final correction.
//!
//! The flow is strictly linear with no retries. HyDE and re-ranking
//! absorb their own failures and degrade; everything else is fatal for
//! the invocation and surfaces as a tagged [`PipelineError`].

pub mod correction;
pub mod hyde;
pub mod orchestrator;

pub use correction::CorrectionGenerator;
pub use hyde::{HydeGenerator, HydeOutcome};
pub use orchestrator::{CorrectionPipeline, PipelineError};
