//! Cleaned-table loading and deterministic partitioning
//!
//! Converts a cleaned [`Table`] into raw records plus integer targets in
//! cents, and splits row indices into training and evaluation partitions
//! with a seeded shuffle.

use crate::config::FeatureConfig;
use crate::deterministic::LcgRng;
use crate::errors::TrainerError;
use crate::table::{cell, Table};
use carprice_core::{parse_numeric, RawRecord, PRICE_SCALE};

/// Training rows and their targets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<RawRecord>,
    /// Prices at target scale (cents)
    pub targets: Vec<i64>,
}

/// Row indices of each partition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub eval: Vec<usize>,
}

impl Dataset {
    /// Read the configured columns out of a cleaned table.
    ///
    /// Empty feature cells are left out of the record so the encoder can
    /// report them; an unparsable target or numeric cell is a dataset error.
    pub fn from_table(table: &Table, features: &FeatureConfig) -> Result<Self, TrainerError> {
        let target_idx = table.require_column(&features.target)?;
        let numeric = resolve(table, &features.numeric)?;
        let categorical = resolve(table, &features.categorical)?;

        let mut records = Vec::with_capacity(table.len());
        let mut targets = Vec::with_capacity(table.len());

        for (line, row) in table.rows.iter().enumerate() {
            let raw_target = cell(row, target_idx);
            let target = parse_price_cents(raw_target).ok_or_else(|| {
                TrainerError::Dataset(format!(
                    "row {}: invalid {} `{raw_target}`",
                    line + 1,
                    features.target
                ))
            })?;

            let mut record = RawRecord::new();
            for (name, idx) in &numeric {
                let raw = cell(row, *idx);
                if raw.is_empty() {
                    continue;
                }
                let value = parse_numeric(raw).ok_or_else(|| {
                    TrainerError::Dataset(format!("row {}: invalid {name} `{raw}`", line + 1))
                })?;
                record.set_numeric(name.as_str(), value);
            }
            for (name, idx) in &categorical {
                let raw = cell(row, *idx);
                if !raw.is_empty() {
                    record.set_category(name.as_str(), raw);
                }
            }

            records.push(record);
            targets.push(target);
        }

        tracing::info!(rows = records.len(), "loaded training rows");
        Ok(Self { records, targets })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Seeded train/eval split; `floor(len * test_fraction)` rows are held out
    pub fn partition(&self, test_fraction: f64, seed: u64) -> Partition {
        let n = self.len();
        let eval_rows = ((n as f64) * test_fraction).floor() as usize;
        let eval_rows = eval_rows.min(n);

        let order = LcgRng::new(seed).permutation(n);
        let (eval, train) = order.split_at(eval_rows);

        Partition {
            train: train.to_vec(),
            eval: eval.to_vec(),
        }
    }
}

fn resolve<'a>(table: &Table, names: &'a [String]) -> Result<Vec<(&'a String, usize)>, TrainerError> {
    names
        .iter()
        .map(|name| table.require_column(name).map(|idx| (name, idx)))
        .collect()
}

/// Parse a dollar amount into cents
pub fn parse_price_cents(raw: &str) -> Option<i64> {
    let dollars = raw.trim().parse::<f64>().ok()?;
    let cents = (dollars * PRICE_SCALE as f64).round();
    if !cents.is_finite() || cents.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}
