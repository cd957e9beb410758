use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::error::MolIoError;
use crate::core::io::sink::SinkError;
use crate::core::models::color::MetadataMismatch;
use crate::core::scoring::ScoringError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read molecules: {0}")]
    Input(#[from] MolIoError),

    #[error("Scoring failed for {context}: {source}")]
    Scoring {
        context: String,
        #[source]
        source: ScoringError,
    },

    #[error("Color atoms of reference '{reference}' are inconsistent at {context}: {source}")]
    Consistency {
        reference: String,
        context: String,
        #[source]
        source: MetadataMismatch,
    },

    #[error("Result shape mismatch: {0}")]
    Shape(String),

    #[error("No reference molecules were provided")]
    EmptyReferenceSet,

    #[error("Execution backend failed: {0}")]
    Execution(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to persist results: {0}")]
    Persistence(#[from] SinkError),
}

impl EngineError {
    pub(crate) fn scoring(context: impl Into<String>) -> impl FnOnce(ScoringError) -> Self {
        let context = context.into();
        move |source| EngineError::Scoring { context, source }
    }
}
