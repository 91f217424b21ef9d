//! Regression metrics
//!
//! Computed in dollars over one partition. R² follows the usual convention
//! for a constant target: 1.0 for a perfect fit, 0.0 otherwise.

use carprice_core::EvaluationMetrics;

/// MAE, RMSE and R² of `predictions` against `targets`.
///
/// Returns `None` for an empty partition.
pub fn evaluate(predictions: &[f64], targets: &[f64]) -> Option<EvaluationMetrics> {
    debug_assert_eq!(predictions.len(), targets.len());
    if predictions.is_empty() {
        return None;
    }

    Some(EvaluationMetrics {
        mae: mae(predictions, targets),
        rmse: rmse(predictions, targets),
        r2: r2(predictions, targets),
        rows: predictions.len(),
    })
}

/// Mean Absolute Error: mean(|pred - label|)
pub fn mae(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }
    let sum: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).abs())
        .sum();
    sum / predictions.len() as f64
}

/// Root Mean Squared Error: sqrt(mean((pred - label)²))
pub fn rmse(predictions: &[f64], targets: &[f64]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }
    (sum_squared_residuals(predictions, targets) / predictions.len() as f64).sqrt()
}

/// Coefficient of determination: 1 - SS_res / SS_tot
pub fn r2(predictions: &[f64], targets: &[f64]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }

    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let ss_tot: f64 = targets.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res = sum_squared_residuals(predictions, targets);

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn sum_squared_residuals(predictions: &[f64], targets: &[f64]) -> f64 {
    predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum()
}
