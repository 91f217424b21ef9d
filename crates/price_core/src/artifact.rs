//! Persisted (model, schema) pairs
//!
//! An artifact directory holds three files written by one training run:
//!
//! - `model.json`: canonical JSON of the GBDT model
//! - `schema.json`: canonical JSON of the feature schema
//! - `manifest.json`: run metadata plus BLAKE3 digests of the other two
//!
//! The manifest is written last. Loading recomputes both digests, so a model
//! and a schema from different runs never load as a pair.

use crate::errors::{PricingError, Result};
use crate::gbdt::Model;
use crate::schema::Schema;
use crate::serde_canon::{hash_bytes_hex, to_canonical_json};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const MODEL_FILE: &str = "model.json";
pub const SCHEMA_FILE: &str = "schema.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Artifact layout version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Regression quality on one partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Mean absolute error in dollars
    pub mae: f64,
    /// Root mean squared error in dollars
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    pub rows: usize,
}

/// Run facts recorded alongside the artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub seed: u64,
    pub train_rows: usize,
    pub eval_rows: usize,
    pub num_trees: usize,
    pub train_metrics: Option<EvaluationMetrics>,
    pub eval_metrics: Option<EvaluationMetrics>,
    /// Training configuration as supplied by the trainer
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format_version: u32,
    /// Derived from the two file digests
    pub run_id: String,
    /// RFC 3339 creation time
    pub created_at: String,
    pub model_hash: String,
    pub schema_hash: String,
    pub feature_count: usize,
    pub report: TrainingReport,
}

/// A trained model bundled with the schema it was trained against
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub model: Model,
    pub schema: Schema,
}

impl ModelArtifact {
    pub fn new(model: Model, schema: Schema) -> Self {
        Self { model, schema }
    }

    /// Write the artifact into `dir`, creating it if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P, report: &TrainingReport) -> Result<ArtifactManifest> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let model_json = to_canonical_json(&self.model)?;
        let schema_json = to_canonical_json(&self.schema)?;
        let model_hash = hash_bytes_hex(model_json.as_bytes());
        let schema_hash = hash_bytes_hex(schema_json.as_bytes());
        let run_id = hash_bytes_hex(format!("{model_hash}:{schema_hash}").as_bytes())[..16].to_string();

        let manifest = ArtifactManifest {
            format_version: ARTIFACT_FORMAT_VERSION,
            run_id,
            created_at: chrono::Utc::now().to_rfc3339(),
            model_hash,
            schema_hash,
            feature_count: self.schema.len(),
            report: report.clone(),
        };

        fs::write(dir.join(SCHEMA_FILE), &schema_json)?;
        fs::write(dir.join(MODEL_FILE), &model_json)?;
        fs::write(dir.join(MANIFEST_FILE), to_canonical_json(&manifest)?)?;

        info!(
            dir = %dir.display(),
            run_id = %manifest.run_id,
            columns = self.schema.len(),
            trees = self.model.num_trees(),
            "saved model artifact"
        );
        Ok(manifest)
    }

    /// Load and verify an artifact directory
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<(Self, ArtifactManifest)> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(PricingError::artifact_load(dir, "artifact directory not found"));
        }

        let manifest_bytes = read_file(dir, MANIFEST_FILE)?;
        let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| PricingError::artifact_load(dir.join(MANIFEST_FILE), e))?;

        if manifest.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PricingError::artifact_load(
                dir,
                format!("unsupported artifact format {}", manifest.format_version),
            ));
        }

        let model_bytes = read_file(dir, MODEL_FILE)?;
        let schema_bytes = read_file(dir, SCHEMA_FILE)?;
        verify_digest(dir, MODEL_FILE, &model_bytes, &manifest.model_hash)?;
        verify_digest(dir, SCHEMA_FILE, &schema_bytes, &manifest.schema_hash)?;

        let model: Model = serde_json::from_slice(&model_bytes)
            .map_err(|e| PricingError::artifact_load(dir.join(MODEL_FILE), e))?;
        model
            .validate()
            .map_err(|e| PricingError::artifact_load(dir.join(MODEL_FILE), e))?;

        let schema: Schema = serde_json::from_slice(&schema_bytes)
            .map_err(|e| PricingError::artifact_load(dir.join(SCHEMA_FILE), e))?;

        debug!(run_id = %manifest.run_id, "artifact digests verified");
        info!(
            dir = %dir.display(),
            run_id = %manifest.run_id,
            columns = schema.len(),
            trees = model.num_trees(),
            "loaded model artifact"
        );

        Ok((Self { model, schema }, manifest))
    }
}

fn read_file(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    fs::read(&path).map_err(|e| PricingError::artifact_load(path, e))
}

fn verify_digest(dir: &Path, name: &str, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = hash_bytes_hex(bytes);
    if actual != expected {
        return Err(PricingError::artifact_load(
            dir.join(name),
            format!("digest mismatch: manifest has {expected}, file has {actual}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::{Node, Tree, SCALE};
    use crate::record::RawRecord;

    fn artifact() -> ModelArtifact {
        let rows = vec![
            RawRecord::new().with_category("fuel", "gas").with_numeric("odometer", 10),
            RawRecord::new().with_category("fuel", "diesel").with_numeric("odometer", 20),
        ];
        let schema = Schema::from_records(&["odometer"], &["fuel"], &rows).unwrap();
        let tree = Tree::new(
            vec![
                Node::internal(0, 1, 0, 1, 2),
                Node::leaf(1, 500),
                Node::leaf(2, -500),
            ],
            SCALE,
        );
        ModelArtifact::new(Model::new(vec![tree], 10_000, schema.len()), schema)
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let original = artifact();
        let saved = original.save(dir.path(), &TrainingReport::default()).unwrap();

        let (loaded, manifest) = ModelArtifact::load(dir.path()).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(manifest, saved);
        assert_eq!(manifest.feature_count, 3);
        assert_eq!(manifest.run_id.len(), 16);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PricingError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        artifact().save(dir.path(), &TrainingReport::default()).unwrap();
        fs::remove_file(dir.path().join(MODEL_FILE)).unwrap();

        let err = ModelArtifact::load(dir.path()).unwrap_err();
        assert!(matches!(err, PricingError::ArtifactLoad { ref path, .. } if path.ends_with(MODEL_FILE)));
    }

    #[test]
    fn test_schema_from_other_run_is_rejected() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        artifact().save(dir_a.path(), &TrainingReport::default()).unwrap();

        let mut other = artifact();
        other.schema = Schema::from_records(
            &["odometer"],
            &["fuel"],
            &[RawRecord::new().with_category("fuel", "electric")],
        )
        .unwrap();
        other.model.feature_count = other.schema.len();
        other.save(dir_b.path(), &TrainingReport::default()).unwrap();

        fs::copy(dir_b.path().join(SCHEMA_FILE), dir_a.path().join(SCHEMA_FILE)).unwrap();

        let err = ModelArtifact::load(dir_a.path()).unwrap_err();
        match err {
            PricingError::ArtifactLoad { reason, .. } => assert!(reason.contains("digest mismatch")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_manifest() {
        let dir = tempfile::tempdir().unwrap();
        artifact().save(dir.path(), &TrainingReport::default()).unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{not json").unwrap();

        assert!(matches!(
            ModelArtifact::load(dir.path()),
            Err(PricingError::ArtifactLoad { .. })
        ));
    }
}
