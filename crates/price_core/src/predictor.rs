//! Price prediction against a loaded artifact
//!
//! [`PredictorState`] is built once at startup and then only read. It owns
//! the model and the schema it was trained with, so every prediction is
//! encoded against exactly that schema. The state is `Send + Sync`; share it
//! by reference or behind an `Arc`.

use crate::artifact::{ArtifactManifest, ModelArtifact};
use crate::encoder::{encode, EncodedVector};
use crate::errors::{PricingError, Result};
use crate::record::RawRecord;
use crate::schema::Schema;
use std::path::Path;

/// Encode `record` against the artifact's schema and score it in dollars
pub fn predict(record: &RawRecord, artifact: &ModelArtifact) -> Result<f64> {
    let vector = encode(record, &artifact.schema)?;
    score_vector(&vector, artifact)
}

/// Score an already encoded vector
pub fn score_vector(vector: &EncodedVector, artifact: &ModelArtifact) -> Result<f64> {
    let price = artifact
        .model
        .predict(vector)
        .map_err(|e| PricingError::Prediction(e.to_string()))?;

    if !price.is_finite() {
        return Err(PricingError::Prediction(format!("non-finite price {price}")));
    }
    Ok(price)
}

/// Process-wide, read-only prediction state
#[derive(Debug)]
pub struct PredictorState {
    artifact: ModelArtifact,
    manifest: Option<ArtifactManifest>,
}

impl PredictorState {
    /// Load and verify an artifact directory.
    ///
    /// Fails with [`PricingError::ArtifactLoad`]; callers must not serve
    /// predictions without a loaded state.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let (artifact, manifest) = ModelArtifact::load(dir)?;
        Ok(Self {
            artifact,
            manifest: Some(manifest),
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self {
            artifact,
            manifest: None,
        }
    }

    pub fn predict(&self, record: &RawRecord) -> Result<f64> {
        predict(record, &self.artifact)
    }

    pub fn schema(&self) -> &Schema {
        &self.artifact.schema
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn manifest(&self) -> Option<&ArtifactManifest> {
        self.manifest.as_ref()
    }
}
