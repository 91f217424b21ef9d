//! End-to-end training run
//!
//! cleaned table → schema → encoded rows → seeded split → GBDT → metrics →
//! artifact. The schema is built from every row before the split, so the
//! evaluation partition never meets an attribute value the schema lacks.

use crate::config::PipelineConfig;
use crate::dataset::{Dataset, Partition};
use crate::errors::TrainerError;
use crate::metrics;
use crate::table::Table;
use crate::trainer::GbdtTrainer;
use carprice_core::artifact::ArtifactManifest;
use carprice_core::predictor::score_vector;
use carprice_core::{
    encode_batch, EncodedVector, ModelArtifact, PricingError, RawRecord, Schema, TrainingReport,
    PRICE_SCALE,
};
use std::path::Path;
use tracing::info;

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: TrainingReport,
    /// Held-out records, in partition order
    pub eval_records: Vec<RawRecord>,
    /// Model output for `eval_records`, in dollars
    pub eval_predictions: Vec<f64>,
}

/// Train on an already cleaned table
pub fn train_from_table(table: &Table, config: &PipelineConfig) -> Result<TrainingOutcome, TrainerError> {
    config.validate()?;

    let dataset = Dataset::from_table(table, &config.features)?;
    if dataset.is_empty() {
        return Err(TrainerError::insufficient("table has no rows after cleaning"));
    }

    let schema = Schema::from_records(
        &config.features.numeric_names(),
        &config.features.categorical_names(),
        &dataset.records,
    )?;
    let vectors = encode_batch(&dataset.records, &schema)?;

    let Partition { train, eval } = dataset.partition(config.split.test_fraction, config.split.seed);
    if train.is_empty() {
        return Err(TrainerError::insufficient("training partition is empty"));
    }
    info!(
        train = train.len(),
        eval = eval.len(),
        seed = config.split.seed,
        "partitioned rows"
    );

    let train_x: Vec<EncodedVector> = train.iter().map(|&i| vectors[i].clone()).collect();
    let train_y: Vec<i64> = train.iter().map(|&i| dataset.targets[i]).collect();

    let model = GbdtTrainer::new(config.gbdt.clone()).train(&train_x, &train_y)?;
    let artifact = ModelArtifact::new(model, schema);

    let train_predictions = score_rows(&artifact, &vectors, &train)?;
    let eval_predictions = score_rows(&artifact, &vectors, &eval)?;

    let train_metrics = metrics::evaluate(&train_predictions, &dollars(&dataset.targets, &train));
    let eval_metrics = metrics::evaluate(&eval_predictions, &dollars(&dataset.targets, &eval));

    if let Some(m) = &eval_metrics {
        info!(mae = m.mae, rmse = m.rmse, r2 = m.r2, rows = m.rows, "evaluation metrics");
    } else {
        info!("evaluation partition is empty; no metrics reported");
    }

    let report = TrainingReport {
        seed: config.split.seed,
        train_rows: train.len(),
        eval_rows: eval.len(),
        num_trees: artifact.model.num_trees(),
        train_metrics,
        eval_metrics,
        config: serde_json::to_value(config).map_err(PricingError::from)?,
    };

    let eval_records = eval.iter().map(|&i| dataset.records[i].clone()).collect();

    Ok(TrainingOutcome {
        artifact,
        report,
        eval_records,
        eval_predictions,
    })
}

/// Read a cleaned CSV, train, and save the artifact into `output_dir`
pub fn run_training<P, Q>(
    input: P,
    output_dir: Q,
    config: &PipelineConfig,
) -> Result<(TrainingOutcome, ArtifactManifest), TrainerError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref();
    info!(input = %input.display(), "loading cleaned table");
    let table = Table::read_csv(input)?;

    let outcome = train_from_table(&table, config)?;
    let manifest = outcome.artifact.save(output_dir, &outcome.report)?;
    Ok((outcome, manifest))
}

fn score_rows(
    artifact: &ModelArtifact,
    vectors: &[EncodedVector],
    rows: &[usize],
) -> Result<Vec<f64>, TrainerError> {
    rows.iter()
        .map(|&i| score_vector(&vectors[i], artifact).map_err(TrainerError::from))
        .collect()
}

fn dollars(targets: &[i64], rows: &[usize]) -> Vec<f64> {
    rows.iter()
        .map(|&i| targets[i] as f64 / PRICE_SCALE as f64)
        .collect()
}
