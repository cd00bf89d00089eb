//! Application state
//!
//! Shared state across all handlers.

use std::sync::Arc;

use corretor_config::Settings;
use corretor_pipeline::{CorrectionPipeline, PipelineError};

/// Application state
///
/// The pipeline is stateless per request, so a single instance behind an
/// `Arc` serves all handlers concurrently.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CorrectionPipeline>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pipeline: CorrectionPipeline, settings: Settings) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            settings: Arc::new(settings),
        }
    }

    /// Build the state from settings, constructing the whole pipeline.
    pub fn from_settings(settings: Settings) -> Result<Self, PipelineError> {
        let pipeline = CorrectionPipeline::from_settings(&settings)?;
        Ok(Self::new(pipeline, settings))
    }
}
