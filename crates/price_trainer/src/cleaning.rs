//! Raw listings cleanup
//!
//! Produces the cleaned table the trainer consumes: drops identifier-like
//! columns, imputes missing values, filters implausible prices and
//! odometer readings, and replaces `year` with `car_age`.

use crate::errors::TrainerError;
use crate::table::{cell, Table};
use carprice_core::{car_age, parse_numeric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Cleaning thresholds and imputation defaults
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Columns removed before anything else (absent ones are ignored)
    pub drop_columns: Vec<String>,
    /// Replacement for empty categorical cells, per column
    pub fill_values: BTreeMap<String, String>,
    /// Exclusive price bounds in dollars
    pub price_min: i64,
    pub price_max: i64,
    /// Exclusive odometer bounds in miles
    pub odometer_min: i64,
    pub odometer_max: i64,
    /// Model year assumed when `year` is missing
    pub default_year: i64,
    /// Year that car ages are measured against
    pub reference_year: i64,
    pub price_column: String,
    pub odometer_column: String,
    pub year_column: String,
    pub age_column: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        let drop_columns = [
            "id",
            "url",
            "region_url",
            "VIN",
            "image_url",
            "description",
            "county",
            "lat",
            "long",
            "posting_date",
        ];
        let fill_values = [
            ("manufacturer", "unknown"),
            ("model", "unknown"),
            ("fuel", "gas"),
            ("transmission", "automatic"),
        ];

        Self {
            drop_columns: drop_columns.iter().map(|s| s.to_string()).collect(),
            fill_values: fill_values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            price_min: 1_000,
            price_max: 100_000,
            odometer_min: 1_000,
            odometer_max: 300_000,
            default_year: 2015,
            reference_year: 2026,
            price_column: "price".into(),
            odometer_column: "odometer".into(),
            year_column: "year".into(),
            age_column: "car_age".into(),
        }
    }
}

/// What a cleaning pass did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub dropped_columns: Vec<String>,
    pub filled_cells: usize,
    pub odometer_median: Option<i64>,
}

/// Clean `table` in place
pub fn clean_table(table: &mut Table, config: &CleaningConfig) -> Result<CleanReport, TrainerError> {
    let mut report = CleanReport {
        rows_in: table.len(),
        ..Default::default()
    };

    report.dropped_columns = table.drop_columns(&config.drop_columns);
    info!(columns = ?report.dropped_columns, "dropped unused columns");

    for (column, fill) in &config.fill_values {
        let Some(idx) = table.column_index(column) else {
            continue;
        };
        for row in &mut table.rows {
            if cell(row, idx).is_empty() {
                if let Some(slot) = row.get_mut(idx) {
                    *slot = fill.clone();
                    report.filled_cells += 1;
                }
            }
        }
    }

    let price_idx = table.require_column(&config.price_column)?;
    let odometer_idx = table.require_column(&config.odometer_column)?;

    // Median over parsable readings, before range filtering
    report.odometer_median = median(
        table
            .rows
            .iter()
            .filter_map(|row| parse_numeric(cell(row, odometer_idx))),
    );
    if let Some(median) = report.odometer_median {
        for row in &mut table.rows {
            if parse_numeric(cell(row, odometer_idx)).is_none() {
                row[odometer_idx] = median.to_string();
                report.filled_cells += 1;
            }
        }
    }

    // Bounds apply to the readings as written, before any rounding
    table.rows.retain(|row| {
        let in_range = |value: Option<f64>, min: i64, max: i64| {
            value.map(|v| v > min as f64 && v < max as f64).unwrap_or(false)
        };
        in_range(parse_reading(cell(row, price_idx)), config.price_min, config.price_max)
            && in_range(
                parse_reading(cell(row, odometer_idx)),
                config.odometer_min,
                config.odometer_max,
            )
    });
    info!(rows = table.len(), "filtered price and odometer outliers");

    if let Some(year_idx) = table.column_index(&config.year_column) {
        let default_year = config.default_year;
        let reference_year = config.reference_year;
        table.push_column(&config.age_column, |row| {
            let year = parse_numeric(cell(row, year_idx)).unwrap_or(default_year);
            car_age(reference_year, year).to_string()
        });
        table.drop_columns(std::slice::from_ref(&config.year_column));
    }

    report.rows_out = table.len();
    info!(
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        filled = report.filled_cells,
        "cleaning complete"
    );
    Ok(report)
}

fn parse_reading(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Median of integer readings (lower-upper mean for even counts)
fn median<I: IntoIterator<Item = i64>>(values: I) -> Option<i64> {
    let mut values: Vec<i64> = values.into_iter().collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some(values[mid - 1] + (values[mid] - values[mid - 1]) / 2)
    }
}
