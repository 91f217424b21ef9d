//! Error types for the pricing core

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while encoding, loading artifacts or scoring records
#[derive(Error, Debug)]
pub enum PricingError {
    /// A numeric attribute required by the schema is absent from the record
    #[error("missing required numeric feature `{0}`")]
    MissingFeature(String),

    /// A numeric attribute was supplied as a categorical string
    #[error("feature `{0}` must be numeric")]
    NonNumericFeature(String),

    /// A record could not be parsed from its textual form
    #[error("malformed record: {0}")]
    InvalidRecord(String),

    /// Schema construction or validation failed
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Training table is empty or degenerate after filtering
    #[error("insufficient training data: {0}")]
    InsufficientData(String),

    /// Persisted model or schema is missing, unreadable or inconsistent
    #[error("failed to load artifact from {}: {reason}", path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Encoded vector and model disagree on shape or numeric domain
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PricingError {
    fn from(err: serde_json::Error) -> Self {
        PricingError::Serialization(err.to_string())
    }
}

impl PricingError {
    pub(crate) fn artifact_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PricingError::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for pricing core operations
pub type Result<T> = std::result::Result<T, PricingError>;
