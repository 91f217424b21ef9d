//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Implements deterministic GBDT training with fixed-point arithmetic
//! and exact-greedy CART splits. Running predictions are updated with
//! [`weighted_leaf`], the same helper the model uses at inference, so the
//! fitted model scores its training rows exactly as training saw them.

use carprice_core::gbdt::{weighted_leaf, Model, Tree, SCALE};
use serde::{Deserialize, Serialize};

use crate::cart::{CartBuilder, TreeConfig, UNIT_HESSIAN};
use crate::errors::TrainerError;

/// GBDT training configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: i64, // Fixed-point, e.g., 100_000 = 0.1
    pub max_thresholds: usize,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 7,
            min_samples_leaf: 1,
            learning_rate: 100_000, // 0.1 in fixed-point
            max_thresholds: 64,
        }
    }
}

impl GbdtConfig {
    pub fn validate(&self) -> Result<(), TrainerError> {
        if self.max_depth == 0 {
            return Err(TrainerError::Config("gbdt.max_depth must be at least 1".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(TrainerError::Config(
                "gbdt.min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_thresholds == 0 {
            return Err(TrainerError::Config(
                "gbdt.max_thresholds must be at least 1".into(),
            ));
        }
        if self.learning_rate <= 0 || self.learning_rate > SCALE {
            return Err(TrainerError::Config(format!(
                "gbdt.learning_rate must be in (0, {SCALE}], got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            max_thresholds: self.max_thresholds,
        }
    }
}

/// GBDT trainer
pub struct GbdtTrainer {
    config: GbdtConfig,
}

impl GbdtTrainer {
    pub fn new(config: GbdtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GbdtConfig {
        &self.config
    }

    /// Fit a model on encoded rows and targets at price scale (cents)
    pub fn train(&self, features: &[Vec<i64>], targets: &[i64]) -> Result<Model, TrainerError> {
        self.config.validate()?;

        if features.is_empty() {
            return Err(TrainerError::insufficient("no training rows"));
        }
        if features.len() != targets.len() {
            return Err(TrainerError::Training(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }

        let feature_count = features[0].len();
        if let Some(row) = features.iter().position(|f| f.len() != feature_count) {
            return Err(TrainerError::Training(format!(
                "row {row} has {} features, expected {feature_count}",
                features[row].len()
            )));
        }

        let bias = calculate_bias(targets);
        let mut predictions = vec![bias; targets.len()];
        let hessians = vec![UNIT_HESSIAN; targets.len()];
        let rows: Vec<usize> = (0..targets.len()).collect();

        let mut trees = Vec::with_capacity(self.config.num_trees);

        for tree_idx in 0..self.config.num_trees {
            let gradients = calculate_gradients(targets, &predictions);

            let builder = CartBuilder::new(features, &gradients, &hessians, self.config.tree_config());
            let tree = builder.build(&rows, self.config.learning_rate);

            update_predictions(&tree, features, &mut predictions, tree_idx)?;

            tracing::debug!(
                tree = tree_idx + 1,
                of = self.config.num_trees,
                nodes = tree.nodes.len(),
                "fitted tree"
            );
            trees.push(tree);
        }

        let model = Model::new(trees, bias, feature_count);
        model
            .validate()
            .map_err(|e| TrainerError::Training(e.to_string()))?;

        tracing::info!(
            trees = model.num_trees(),
            features = feature_count,
            bias,
            "training complete"
        );
        Ok(model)
    }
}

/// Initial prediction: mean of the targets
fn calculate_bias(targets: &[i64]) -> i64 {
    if targets.is_empty() {
        return 0;
    }

    let sum: i128 = targets.iter().map(|&t| t as i128).sum();
    (sum / targets.len() as i128) as i64
}

/// Squared-error gradients: `prediction - target`
fn calculate_gradients(targets: &[i64], predictions: &[i64]) -> Vec<i64> {
    predictions
        .iter()
        .zip(targets)
        .map(|(&pred, &target)| pred.saturating_sub(target))
        .collect()
}

fn update_predictions(
    tree: &Tree,
    features: &[Vec<i64>],
    predictions: &mut [i64],
    tree_idx: usize,
) -> Result<(), TrainerError> {
    for (pred, row) in predictions.iter_mut().zip(features) {
        let leaf = tree
            .evaluate(row)
            .ok_or_else(|| TrainerError::Training(format!("tree {tree_idx} is malformed")))?;
        *pred = pred.saturating_add(weighted_leaf(leaf, tree.weight, SCALE));
    }
    Ok(())
}
