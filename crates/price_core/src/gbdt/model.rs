//! GBDT model with integer-only inference
//!
//! Scores are accumulated as `bias + Σ leaf * weight / scale`, using the same
//! saturating arithmetic the trainer uses while boosting, so a reloaded model
//! reproduces training-time predictions exactly.

use super::tree::Tree;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// GBDT model errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model validation failed: {0}")]
    ValidationFailed(String),

    #[error("expected {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("tree {0} could not be evaluated")]
    BrokenTree(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Fixed-point scale for tree weights (1e6)
pub const SCALE: i64 = 1_000_000;

/// Target units per dollar: models score prices in cents
pub const PRICE_SCALE: i64 = 100;

/// Current model format version
pub const MODEL_VERSION: i32 = 1;

/// Weighted contribution of one leaf value
#[inline]
pub fn weighted_leaf(leaf: i64, weight: i64, scale: i64) -> i64 {
    leaf.saturating_mul(weight) / scale
}

/// Gradient boosted regression model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// Model format version
    pub version: i32,

    /// Fixed-point scale of tree weights
    pub scale: i64,

    /// Target units per output unit (cents per dollar)
    pub target_scale: i64,

    /// Width of the feature vectors this model accepts
    pub feature_count: usize,

    /// Decision trees in the ensemble
    pub trees: Vec<Tree>,

    /// Initial prediction at target scale
    pub bias: i64,
}

impl Model {
    pub fn new(trees: Vec<Tree>, bias: i64, feature_count: usize) -> Self {
        Self {
            version: MODEL_VERSION,
            scale: SCALE,
            target_scale: PRICE_SCALE,
            feature_count,
            trees,
            bias,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != MODEL_VERSION {
            return Err(ModelError::ValidationFailed(format!(
                "unsupported model version: {}",
                self.version
            )));
        }

        if self.scale <= 0 || self.target_scale <= 0 {
            return Err(ModelError::ValidationFailed(format!(
                "invalid scale {} / target scale {}",
                self.scale, self.target_scale
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                ModelError::ValidationFailed(format!("tree {i} validation failed: {e}"))
            })?;

            if let Some(max) = tree.max_feature_index() {
                if max >= self.feature_count {
                    return Err(ModelError::ValidationFailed(format!(
                        "tree {i} splits on feature {max} but model has {} features",
                        self.feature_count
                    )));
                }
            }
        }

        Ok(())
    }

    /// Score a feature vector at target scale, rejecting shape mismatches
    pub fn try_score(&self, features: &[i64]) -> Result<i64, ModelError> {
        if features.len() != self.feature_count {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.feature_count,
                actual: features.len(),
            });
        }

        let mut sum = self.bias;
        for (i, tree) in self.trees.iter().enumerate() {
            let leaf = tree.evaluate(features).ok_or(ModelError::BrokenTree(i))?;
            sum = sum.saturating_add(weighted_leaf(leaf, tree.weight, self.scale));
        }

        Ok(sum)
    }

    /// Score converted to output units (dollars)
    pub fn predict(&self, features: &[i64]) -> Result<f64, ModelError> {
        let score = self.try_score(features)?;
        Ok(score as f64 / self.target_scale as f64)
    }

    pub fn to_canonical_json(&self) -> Result<String, ModelError> {
        Ok(to_canonical_json(self)?)
    }

    /// BLAKE3 hash of the canonical JSON representation
    pub fn hash_hex(&self) -> Result<String, ModelError> {
        Ok(hash_canonical_hex(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        fs::write(path, self.to_canonical_json()?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path)?;
        let model: Model = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tree::Node;

    fn create_test_model() -> Model {
        let tree1 = Tree::new(
            vec![
                Node::internal(0, 0, 50, 1, 2),
                Node::leaf(1, 100 * PRICE_SCALE),
                Node::leaf(2, 200 * PRICE_SCALE),
            ],
            SCALE,
        );

        let tree2 = Tree::new(
            vec![
                Node::internal(0, 1, 30, 1, 2),
                Node::leaf(1, -50 * PRICE_SCALE),
                Node::leaf(2, 50 * PRICE_SCALE),
            ],
            SCALE / 2,
        );

        Model::new(vec![tree1, tree2], 1_000 * PRICE_SCALE, 2)
    }

    #[test]
    fn test_model_inference() {
        let model = create_test_model();
        assert!(model.validate().is_ok());

        // 1000 + 100 + (-50 / 2)
        assert_eq!(model.try_score(&[30, 20]).unwrap(), 1_075 * PRICE_SCALE);
        // 1000 + 200 + (50 / 2)
        assert_eq!(model.try_score(&[60, 40]).unwrap(), 1_225 * PRICE_SCALE);
        assert_eq!(model.predict(&[60, 40]).unwrap(), 1_225.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let model = create_test_model();
        let err = model.try_score(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureCountMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_weighted_leaf_saturates() {
        assert_eq!(weighted_leaf(10, SCALE / 10, SCALE), 1);
        assert_eq!(weighted_leaf(i64::MAX, 2, SCALE), i64::MAX / SCALE);
    }

    #[test]
    fn test_canonical_json() {
        let model = create_test_model();
        let json = model.to_canonical_json().unwrap();

        assert!(!json.contains('\n'));
        let bias_pos = json.find("\"bias\"").unwrap();
        let trees_pos = json.find("\"trees\"").unwrap();
        assert!(bias_pos < trees_pos);
    }

    #[test]
    fn test_hash_changes_with_model() {
        let model1 = create_test_model();
        let mut model2 = create_test_model();
        model2.bias += 1;

        assert_eq!(model1.hash_hex().unwrap(), create_test_model().hash_hex().unwrap());
        assert_ne!(model1.hash_hex().unwrap(), model2.hash_hex().unwrap());
        assert_eq!(model1.hash_hex().unwrap().len(), 64);
    }

    #[test]
    fn test_save_load_json() {
        let model = create_test_model();
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        model.save_json(temp_file.path()).unwrap();
        let loaded = Model::load_json(temp_file.path()).unwrap();

        assert_eq!(model, loaded);
        assert_eq!(model.try_score(&[60, 10]).unwrap(), loaded.try_score(&[60, 10]).unwrap());
    }

    #[test]
    fn test_model_validation() {
        let mut invalid = create_test_model();
        invalid.scale = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.version = 999;
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.feature_count = 1;
        assert!(invalid.validate().is_err());
    }
}
