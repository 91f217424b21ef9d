use carprice_core::PricingError;
use thiserror::Error;

/// Errors returned by the cleaning and training pipeline.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("training error: {0}")]
    Training(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for TrainerError {
    fn from(err: csv::Error) -> Self {
        TrainerError::Dataset(err.to_string())
    }
}

impl TrainerError {
    /// Shorthand for the insufficient-data failure shared with the core crate
    pub fn insufficient(reason: impl Into<String>) -> Self {
        TrainerError::Pricing(PricingError::InsufficientData(reason.into()))
    }
}
