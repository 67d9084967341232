//! Integration tests for the multi-target regressors.
//!
//! These tests fit the public models on small synthetic experiment designs
//! and check the composition, labeling and validation behavior end to end.

use emat_multitarget::{
    MultiTargetRegression, PredictOptions, Regressor, RegressorConfig, Table, TwoStageRegressor,
};
use nalgebra::DMatrix;
use polars::prelude::*;
use pretty_assertions::assert_eq;

// ============================================================================
// Helper Functions
// ============================================================================

fn config(standardize: bool) -> RegressorConfig {
    RegressorConfig::builder()
        .standardize_before_fit(standardize)
        .n_restarts_optimizer(1)
        .random_state(0)
        .build()
        .expect("valid config")
}

/// 16 design points over two inputs.
fn design() -> DMatrix<f64> {
    DMatrix::from_fn(16, 2, |i, j| {
        if j == 0 {
            (i % 4) as f64 / 3.0
        } else {
            (i / 4) as f64 / 3.0
        }
    })
}

fn responses(x: &DMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(x.nrows(), 2, |i, j| {
        let (a, b) = (x[(i, 0)], x[(i, 1)]);
        if j == 0 {
            2.0 + 5.0 * a - 3.0 * b + (3.0 * a).sin()
        } else {
            a * b + 0.5 * (2.0 * b).cos()
        }
    })
}

/// Rescale every column to zero mean and unit population variance.
fn unit_variance(mut y: DMatrix<f64>) -> DMatrix<f64> {
    let n = y.nrows() as f64;
    for mut column in y.column_iter_mut() {
        let mean = column.sum() / n;
        let std = (column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        column.apply(|v| *v = (*v - mean) / std);
    }
    y
}

fn named(values: DMatrix<f64>) -> Table {
    Table::new(values)
        .with_column_names(vec!["net_benefit".into(), "travel_time".into()])
        .expect("two columns")
}

// ============================================================================
// Two-Stage Composition
// ============================================================================

#[test]
fn test_predict_is_detrend_plus_residual() {
    let x = Table::new(design());
    let y = named(responses(&x.values));
    let mut model = TwoStageRegressor::new(config(true));
    model.fit(&x, &y).unwrap();

    let probe = Table::new(DMatrix::from_row_slice(3, 2, &[0.1, 0.9, 0.5, 0.5, 0.75, 0.2]));
    let total = model.predict(&probe).unwrap();
    let trend = model.detrend_predict(&probe).unwrap();
    let residual = model.residual_predict(&probe).unwrap();

    assert_eq!(total.values, trend.values + residual.values);
    assert_eq!(total.column_names, trend.column_names);
    assert_eq!(residual.column_names, trend.column_names);
}

#[test]
fn test_two_stage_reproduces_training_data() {
    let x = Table::new(design());
    let y = named(responses(&x.values));
    let mut model = TwoStageRegressor::new(config(true));
    model.fit(&x, &y).unwrap();

    let scores = model.scores(&x, &y, None).unwrap();
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|s| *s > 0.999), "{scores:?}");
}

#[test]
fn test_standardization_no_op_on_unit_variance_targets() {
    let x = Table::new(design());
    let y = Table::new(unit_variance(responses(&x.values)));

    let mut standardized = MultiTargetRegression::new(config(true));
    standardized.fit(&x, &y).unwrap();
    let scale = standardized.scale().unwrap();
    assert!(scale.iter().all(|s| (s - 1.0).abs() < 1e-12));

    let mut raw = MultiTargetRegression::new(config(false));
    raw.fit(&x, &y).unwrap();

    let a = standardized.predict(&x).unwrap();
    let b = raw.predict(&x).unwrap();
    assert!((a.values - b.values).abs().max() < 1e-2);
}

// ============================================================================
// Errors and Options
// ============================================================================

#[test]
fn test_unfitted_and_unsupported_predictions() {
    let x = Table::new(design());
    let model = TwoStageRegressor::new(config(true));
    assert_eq!(model.predict(&x).unwrap_err().error_code(), "NOT_FITTED");

    let mut model = model;
    model.fit(&x, &named(responses(&x.values))).unwrap();
    let std = PredictOptions {
        return_std: true,
        return_cov: false,
    };
    let both = PredictOptions {
        return_std: true,
        return_cov: true,
    };
    let cov = PredictOptions {
        return_std: false,
        return_cov: true,
    };
    assert_eq!(model.predict_with(&x, std).unwrap_err().to_string(), "return_std is not implemented");
    assert_eq!(model.predict_with(&x, both).unwrap_err().to_string(), "return_std is not implemented");
    assert_eq!(model.predict_with(&x, cov).unwrap_err().to_string(), "return_cov is not implemented");
}

#[test]
fn test_row_mismatch_rejected() {
    let x = Table::new(design());
    let y = Table::new(DMatrix::zeros(10, 1));
    let mut model = TwoStageRegressor::new(config(true));
    assert_eq!(model.fit(&x, &y).unwrap_err().error_code(), "SHAPE_MISMATCH");
}

// ============================================================================
// DataFrame Round Trip
// ============================================================================

#[test]
fn test_dataframe_labels_flow_through() {
    let x = design();
    let y = responses(&x);
    let ids: Vec<String> = (0..16).map(|i| format!("exp{i:02}")).collect();
    let df = df! {
        "experiment" => ids.clone(),
        "fuel_price" => x.column(0).iter().copied().collect::<Vec<f64>>(),
        "lanes" => x.column(1).iter().copied().collect::<Vec<f64>>(),
        "net_benefit" => y.column(0).iter().copied().collect::<Vec<f64>>(),
        "travel_time" => y.column(1).iter().copied().collect::<Vec<f64>>(),
    }
    .unwrap();

    let inputs = Table::from_dataframe_indexed(&df, "experiment", &["fuel_price", "lanes"]).unwrap();
    let targets = Table::from_dataframe(&df, &["net_benefit", "travel_time"]).unwrap();
    let mut model = TwoStageRegressor::new(config(true));
    model.fit(&inputs, &targets).unwrap();

    let predicted = model.predict(&inputs).unwrap();
    assert_eq!(predicted.row_labels, Some(ids));
    let out = predicted.to_dataframe().unwrap();
    assert_eq!(out.get_column_names_str(), vec!["index", "net_benefit", "travel_time"]);
    assert_eq!(out.height(), 16);
}

// ============================================================================
// Cross-Validation
// ============================================================================

#[test]
fn test_cross_val_scores_shape() {
    let x = Table::new(design());
    let y = named(responses(&x.values));
    let model = TwoStageRegressor::new(config(true));

    let scores = model.cross_val_scores(&x, &y, 4).unwrap();
    assert_eq!(scores.shape(), (4, 2));
    assert!(scores.iter().all(|s| s.is_finite()));
    assert!(!model.is_fitted());
}

#[test]
fn test_cross_val_rejects_too_many_folds() {
    let x = Table::new(design());
    let y = named(responses(&x.values));
    let model = MultiTargetRegression::new(config(true));
    let err = model.cross_val_scores(&x, &y, 17).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
    // 16 rows leave room for at most 8 two-row blocks
    let err = model.cross_val_scores(&x, &y, 9).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
    assert!(emat_multitarget::kfold(16, 8).is_ok());
}

#[test]
fn test_cross_val_rejects_single_row_folds() {
    let x = Table::new(DMatrix::from_fn(6, 1, |i, _| i as f64));
    let y = Table::new(DMatrix::from_fn(6, 1, |i, _| (i as f64).sin()));
    let model = TwoStageRegressor::new(config(true));
    let err = model.cross_val_scores(&x, &y, 6).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CONFIG");
    assert!(!model.is_fitted());
}
