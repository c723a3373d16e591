//! Error types for the ranking pipeline
//!
//! Only model initialisation, query encoding and bad settings surface as
//! errors. Everything that can go wrong with a single page degrades to a
//! low ranking instead.

use std::path::PathBuf;

/// Boxed source error carried by the fatal variants
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the pipeline and the model loader
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A file the embedding model needs is missing from the model directory
    #[error("embedding model file '{file}' not found in {path}")]
    ModelUnavailable { path: PathBuf, file: &'static str },

    /// Model files exist but could not be read or loaded
    #[error("cannot initialize embedding model from {path}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The persona/task query could not be embedded, so nothing can be scored
    #[error("failed to encode query")]
    QueryEncoding(#[source] BoxError),

    /// Input pages violate the corpus contract
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Settings that cannot produce a result
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl PipelineError {
    /// Whether this error comes from the model resource rather than the input
    pub fn is_model_error(&self) -> bool {
        matches!(
            self,
            Self::ModelUnavailable { .. } | Self::ModelLoad { .. } | Self::QueryEncoding(_)
        )
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
