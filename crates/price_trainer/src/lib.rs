//! CarPrice trainer - raw listings cleanup and deterministic GBDT training
//!
//! Turns a raw listings CSV into a cleaned table, fits a fixed-point GBDT
//! on it and writes a verified model artifact that `carprice-core` loads
//! for inference.

pub mod cart;
pub mod cleaning;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod metrics;
pub mod pipeline;
pub mod table;
pub mod trainer;

use std::path::Path;

pub use cleaning::{clean_table, CleanReport, CleaningConfig};
pub use config::{FeatureConfig, OutputConfig, PipelineConfig, SplitConfig};
pub use dataset::{Dataset, Partition};
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use pipeline::{run_training, train_from_table, TrainingOutcome};
pub use table::Table;
pub use trainer::{GbdtConfig, GbdtTrainer};

/// Clean a raw listings CSV into `output`
pub fn clean_csv<P, Q>(input: P, output: Q, config: &CleaningConfig) -> Result<CleanReport, TrainerError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut table = Table::read_csv(input)?;
    let report = clean_table(&mut table, config)?;
    table.write_csv(output)?;
    Ok(report)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
