//! Coefficient of determination, one value per target column.

use crate::error::{RegressionError, Result};
use nalgebra::DMatrix;

/// `R^2 = 1 - SS_res / SS_tot` for every column, optionally weighted by row.
///
/// A column with zero total variance scores 1.0 when predicted exactly and
/// 0.0 otherwise.
pub fn r2_scores(
    y_true: &DMatrix<f64>,
    y_pred: &DMatrix<f64>,
    sample_weight: Option<&[f64]>,
) -> Result<Vec<f64>> {
    if y_true.shape() != y_pred.shape() {
        let (expected, actual) = if y_true.nrows() != y_pred.nrows() {
            (y_true.nrows(), y_pred.nrows())
        } else {
            (y_true.ncols(), y_pred.ncols())
        };
        return Err(RegressionError::shape("predictions", expected, actual));
    }
    let n = y_true.nrows();
    if n < 2 {
        return Err(RegressionError::InvalidData(
            "R^2 needs at least two samples".to_string(),
        ));
    }
    let weights: Vec<f64> = match sample_weight {
        Some(w) if w.len() != n => return Err(RegressionError::shape("sample weights", n, w.len())),
        Some(w) => w.to_vec(),
        None => vec![1.0; n],
    };
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return Err(RegressionError::InvalidData(
            "sample weights must have a positive sum".to_string(),
        ));
    }

    let scores = y_true
        .column_iter()
        .zip(y_pred.column_iter())
        .map(|(truth, pred)| {
            let mean = truth.iter().zip(&weights).map(|(v, w)| v * w).sum::<f64>() / total_weight;
            let residual: f64 = truth
                .iter()
                .zip(pred.iter())
                .zip(&weights)
                .map(|((t, p), w)| w * (t - p).powi(2))
                .sum();
            let total: f64 = truth
                .iter()
                .zip(&weights)
                .map(|(t, w)| w * (t - mean).powi(2))
                .sum();
            if total == 0.0 {
                if residual == 0.0 { 1.0 } else { 0.0 }
            } else {
                1.0 - residual / total
            }
        })
        .collect();
    Ok(scores)
}
