//! Gaussian process regression over several target columns at once.

use crate::config::RegressorConfig;
use crate::cross_validation::Regressor;
use crate::error::{RegressionError, Result};
use crate::metrics::r2_scores;
use crate::multi_output::MultiOutputGp;
use crate::table::Table;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Extra outputs a caller may ask of `predict_with`. Neither is available;
/// setting either one fails with [`RegressionError::NotImplemented`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictOptions {
    pub return_std: bool,
    pub return_cov: bool,
}

impl PredictOptions {
    pub(crate) fn check(self) -> Result<()> {
        if self.return_std {
            return Err(RegressionError::NotImplemented("return_std"));
        }
        if self.return_cov {
            return Err(RegressionError::NotImplemented("return_cov"));
        }
        Ok(())
    }
}

/// Independent GPs, one per target, optionally fitted on unit-variance
/// targets.
#[derive(Debug, Clone, Default)]
pub struct MultiTargetRegression {
    config: RegressorConfig,
    fitted: Option<FittedGp>,
}

static_assertions::assert_impl_all!(MultiTargetRegression: Send, Sync);

#[derive(Debug, Clone)]
struct FittedGp {
    gps: MultiOutputGp,
    /// Per-column divisor used during fit; `None` when not standardizing.
    scale: Option<DVector<f64>>,
    target_names: Option<Vec<String>>,
}

impl MultiTargetRegression {
    pub fn new(config: RegressorConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &RegressorConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fit one GP per column of `y`.
    ///
    /// On failure the previous fit, if any, is kept.
    pub fn fit(&mut self, x: &Table, y: &Table) -> Result<()> {
        if x.nrows() != y.nrows() {
            return Err(RegressionError::shape("rows", x.nrows(), y.nrows()));
        }
        x.ensure_finite("X")?;
        y.ensure_finite("Y")?;
        let start = Instant::now();

        let (targets, scale) = if self.config.standardize_before_fit {
            let scale = column_std(&y.values);
            let mut targets = y.values.clone();
            for (mut column, s) in targets.column_iter_mut().zip(scale.iter()) {
                column /= *s;
            }
            (targets, Some(scale))
        } else {
            (y.values.clone(), None)
        };

        let gps = MultiOutputGp::fit(
            &x.values,
            &targets,
            !self.config.standardize_before_fit,
            &self.config,
        )?;
        info!(
            "fitted {} target GP(s) on {} rows x {} features in {:.2?}",
            gps.n_targets(),
            x.nrows(),
            x.ncols(),
            start.elapsed()
        );
        self.fitted = Some(FittedGp {
            gps,
            scale,
            target_names: y.column_names.clone(),
        });
        Ok(())
    }

    pub fn predict(&self, x: &Table) -> Result<Table> {
        self.predict_with(x, PredictOptions::default())
    }

    pub fn predict_with(&self, x: &Table, options: PredictOptions) -> Result<Table> {
        options.check()?;
        let fitted = self.fitted.as_ref().ok_or(RegressionError::NotFitted)?;
        let mut values = fitted.gps.predict(&x.values)?;
        if let Some(scale) = &fitted.scale {
            for (mut column, s) in values.column_iter_mut().zip(scale.iter()) {
                column *= *s;
            }
        }
        Ok(label_output(values, x, fitted.target_names.as_deref()))
    }

    /// Per-column R^2 of `predict(x)` against `y`.
    pub fn scores(&self, x: &Table, y: &Table, sample_weight: Option<&[f64]>) -> Result<Vec<f64>> {
        let predicted = self.predict(x)?;
        r2_scores(&y.values, &predicted.values, sample_weight)
    }

    /// Target names seen at fit time.
    pub fn target_names(&self) -> Option<&[String]> {
        self.fitted.as_ref()?.target_names.as_deref()
    }

    /// Per-column standardization divisors, when standardizing.
    pub fn scale(&self) -> Option<&DVector<f64>> {
        self.fitted.as_ref()?.scale.as_ref()
    }

    pub fn gps(&self) -> Option<&MultiOutputGp> {
        self.fitted.as_ref().map(|f| &f.gps)
    }
}

impl Regressor for MultiTargetRegression {
    fn from_config(config: RegressorConfig) -> Self {
        Self::new(config)
    }

    fn config(&self) -> &RegressorConfig {
        &self.config
    }

    fn fit(&mut self, x: &Table, y: &Table) -> Result<()> {
        MultiTargetRegression::fit(self, x, y)
    }

    fn predict(&self, x: &Table) -> Result<Table> {
        MultiTargetRegression::predict(self, x)
    }
}

/// Population standard deviation of each column, with zero replaced by 1.
fn column_std(values: &DMatrix<f64>) -> DVector<f64> {
    let n = values.nrows().max(1) as f64;
    DVector::from_iterator(
        values.ncols(),
        values.column_iter().map(|column| {
            let mean = column.sum() / n;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            if std > 0.0 { std } else { 1.0 }
        }),
    )
}

/// Attach the row labels of `x` and, when the counts agree, the fit-time
/// target names.
pub(crate) fn label_output(values: DMatrix<f64>, x: &Table, names: Option<&[String]>) -> Table {
    let column_names = names
        .filter(|names| names.len() == values.ncols())
        .map(<[String]>::to_vec);
    Table {
        values,
        row_labels: x.row_labels.clone(),
        column_names,
    }
}
