//! Used-car price estimation core
//!
//! Turns raw vehicle attributes into fixed-width feature vectors and scores
//! them with a deterministic GBDT model. The same [`Schema`] that was built
//! at training time travels with the model inside a [`ModelArtifact`], so
//! inference never re-derives column order.
//!
//! Modules:
//! - `record`: raw attribute records
//! - `schema`: ordered feature schema and the category vocabulary builder
//! - `encoder`: schema-positioned encoding of records
//! - `gbdt`: integer-only gradient boosted trees
//! - `artifact`: persisted (model, schema) pairs with digest checks
//! - `predictor`: read-only prediction state
//! - `serde_canon`: canonical JSON and hashing helpers

pub mod artifact;
pub mod encoder;
pub mod errors;
pub mod gbdt;
pub mod predictor;
pub mod record;
pub mod schema;
pub mod serde_canon;

pub use artifact::{ArtifactManifest, EvaluationMetrics, ModelArtifact, TrainingReport};
pub use encoder::{encode, encode_batch, EncodedVector};
pub use errors::{PricingError, Result};
pub use gbdt::{Model, PRICE_SCALE};
pub use predictor::{predict, PredictorState};
pub use record::{car_age, parse_numeric, FeatureValue, RawRecord};
pub use schema::{Column, Schema, VocabularyBuilder};

/// Crate version string recorded in logs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Numeric attributes used by the default feature set, in column order
pub const DEFAULT_NUMERIC: [&str; 2] = ["odometer", "car_age"];

/// Categorical attributes used by the default feature set, in column order
pub const DEFAULT_CATEGORICAL: [&str; 6] = [
    "manufacturer",
    "fuel",
    "transmission",
    "drive",
    "type",
    "cylinders",
];
