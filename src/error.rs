use std::path::PathBuf;

use thiserror::Error;

/// Failure classes for the prediction pipeline.
///
/// Resource failures are fatal to the session: no command renders output on
/// top of a missing reference dataset or model artifact. Encoding misses and
/// prediction failures are recoverable per attempt.
#[derive(Debug, Error)]
pub enum PriceError {
    /// A static resource (reference dataset, model artifact, or codebook)
    /// could not be loaded.
    #[error("resource unavailable: {path:?}: {reason}")]
    ResourceUnavailable { path: PathBuf, reason: String },

    /// A categorical label has no entry in its code table.
    #[error("no {category} code for label '{label}'")]
    EncodingMiss {
        category: &'static str,
        label: String,
    },

    /// The model call failed during inference.
    #[error("prediction failed: {0}")]
    PredictionFailure(String),
}

impl PriceError {
    pub fn resource(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PriceError::ResourceUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
