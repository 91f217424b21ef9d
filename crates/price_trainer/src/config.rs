//! Pipeline configuration
//!
//! All sections have defaults matching the standard used-car feature set,
//! so an empty TOML file is a valid configuration.
//!
//! ```toml
//! [features]
//! target = "price"
//! numeric = ["odometer", "car_age"]
//! categorical = ["manufacturer", "fuel"]
//!
//! [split]
//! test_fraction = 0.2
//! seed = 42
//!
//! [gbdt]
//! num_trees = 100
//! max_depth = 7
//!
//! [output]
//! artifact_dir = "models/carprice"
//! ```

use crate::cleaning::CleaningConfig;
use crate::errors::TrainerError;
use crate::trainer::GbdtConfig;
use carprice_core::{DEFAULT_CATEGORICAL, DEFAULT_NUMERIC};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which table columns feed the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub target: String,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            target: "price".into(),
            numeric: DEFAULT_NUMERIC.iter().map(|s| s.to_string()).collect(),
            categorical: DEFAULT_CATEGORICAL.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FeatureConfig {
    pub fn numeric_names(&self) -> Vec<&str> {
        self.numeric.iter().map(String::as_str).collect()
    }

    pub fn categorical_names(&self) -> Vec<&str> {
        self.categorical.iter().map(String::as_str).collect()
    }
}

/// Train/evaluation partitioning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of rows held out for evaluation, in `[0, 1)`
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Where training writes its artifact
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub artifact_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("models/carprice"),
        }
    }
}

/// Full pipeline configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    pub features: FeatureConfig,
    pub split: SplitConfig,
    pub gbdt: GbdtConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, TrainerError> {
        let config: Self = toml::from_str(text).map_err(|e| TrainerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TrainerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), TrainerError> {
        if !(0.0..1.0).contains(&self.split.test_fraction) {
            return Err(TrainerError::Config(format!(
                "split.test_fraction must be in [0, 1), got {}",
                self.split.test_fraction
            )));
        }
        if self.features.target.is_empty() {
            return Err(TrainerError::Config("features.target is empty".into()));
        }
        if self.features.numeric.is_empty() && self.features.categorical.is_empty() {
            return Err(TrainerError::Config("no feature columns configured".into()));
        }
        if self.features.numeric.contains(&self.features.target)
            || self.features.categorical.contains(&self.features.target)
        {
            return Err(TrainerError::Config(format!(
                "target `{}` is also listed as a feature",
                self.features.target
            )));
        }
        self.gbdt.validate()
    }
}
