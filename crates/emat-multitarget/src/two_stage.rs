//! Linear de-trending followed by Gaussian process regression on the
//! residuals.
//!
//! ```text
//! Y ──► LinearModel ──► R = Y - trend(X) ──► MultiTargetRegression
//!
//! predict(X) = detrend_predict(X) + residual_predict(X)
//! ```

use crate::config::RegressorConfig;
use crate::cross_validation::Regressor;
use crate::error::{RegressionError, Result};
use crate::linear::LinearModel;
use crate::metrics::r2_scores;
use crate::regression::{MultiTargetRegression, PredictOptions, label_output};
use crate::table::Table;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TwoStageRegressor {
    config: RegressorConfig,
    fitted: Option<FittedTwoStage>,
}

static_assertions::assert_impl_all!(TwoStageRegressor: Send, Sync);

#[derive(Debug, Clone)]
struct FittedTwoStage {
    linear: LinearModel,
    residual: MultiTargetRegression,
}

impl TwoStageRegressor {
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

    /// Fit the linear trend, then the GPs on what the trend leaves over.
    ///
    /// The new state replaces the old one only once both stages succeed.
    pub fn fit(&mut self, x: &Table, y: &Table) -> Result<()> {
        if x.nrows() != y.nrows() {
            return Err(RegressionError::shape("rows", x.nrows(), y.nrows()));
        }
        x.ensure_finite("X")?;
        y.ensure_finite("Y")?;

        let linear = LinearModel::fit(&x.values, &y.values)?;
        let residuals = Table {
            values: &y.values - linear.predict(&x.values)?,
            row_labels: y.row_labels.clone(),
            column_names: y.column_names.clone(),
        };
        debug!(
            "de-trended {} target(s); largest residual {:.4}",
            residuals.ncols(),
            residuals.values.amax()
        );

        let mut residual = MultiTargetRegression::new(self.config.clone());
        residual.fit(x, &residuals)?;
        self.fitted = Some(FittedTwoStage { linear, residual });
        Ok(())
    }

    /// Prediction of the linear trend alone.
    pub fn detrend_predict(&self, x: &Table) -> Result<Table> {
        let fitted = self.fitted()?;
        let values = fitted.linear.predict(&x.values)?;
        Ok(label_output(values, x, fitted.residual.target_names()))
    }

    /// Prediction of the residual GPs alone.
    pub fn residual_predict(&self, x: &Table) -> Result<Table> {
        self.residual_predict_with(x, PredictOptions::default())
    }

    pub fn residual_predict_with(&self, x: &Table, options: PredictOptions) -> Result<Table> {
        options.check()?;
        self.fitted()?.residual.predict(x)
    }

    pub fn predict(&self, x: &Table) -> Result<Table> {
        self.predict_with(x, PredictOptions::default())
    }

    /// Sum of [`detrend_predict`](Self::detrend_predict) and
    /// [`residual_predict`](Self::residual_predict).
    pub fn predict_with(&self, x: &Table, options: PredictOptions) -> Result<Table> {
        options.check()?;
        let trend = self.detrend_predict(x)?;
        let residual = self.residual_predict(x)?;
        Ok(Table {
            values: trend.values + residual.values,
            ..trend
        })
    }

    pub fn scores(&self, x: &Table, y: &Table, sample_weight: Option<&[f64]>) -> Result<Vec<f64>> {
        let predicted = self.predict(x)?;
        r2_scores(&y.values, &predicted.values, sample_weight)
    }

    pub fn linear(&self) -> Option<&LinearModel> {
        self.fitted.as_ref().map(|f| &f.linear)
    }

    pub fn residual_model(&self) -> Option<&MultiTargetRegression> {
        self.fitted.as_ref().map(|f| &f.residual)
    }

    fn fitted(&self) -> Result<&FittedTwoStage> {
        self.fitted.as_ref().ok_or(RegressionError::NotFitted)
    }
}

impl Regressor for TwoStageRegressor {
    fn from_config(config: RegressorConfig) -> Self {
        Self::new(config)
    }

    fn config(&self) -> &RegressorConfig {
        &self.config
    }

    fn fit(&mut self, x: &Table, y: &Table) -> Result<()> {
        TwoStageRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Table) -> Result<Table> {
        TwoStageRegressor::predict(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use pretty_assertions::assert_eq;

    fn config() -> RegressorConfig {
        RegressorConfig::builder()
            .n_restarts_optimizer(1)
            .random_state(2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_not_fitted() {
        let model = TwoStageRegressor::new(config());
        let x = Table::new(DMatrix::zeros(3, 1));
        for err in [
            model.predict(&x).unwrap_err(),
            model.detrend_predict(&x).unwrap_err(),
            model.residual_predict(&x).unwrap_err(),
        ] {
            assert_eq!(err.error_code(), "NOT_FITTED");
        }
    }

    #[test]
    fn test_predict_options_checked_before_fit_state() {
        let model = TwoStageRegressor::new(config());
        let x = Table::new(DMatrix::zeros(3, 1));
        let options = PredictOptions {
            return_cov: true,
            ..Default::default()
        };
        assert_eq!(
            model.predict_with(&x, options).unwrap_err().error_code(),
            "NOT_IMPLEMENTED"
        );
        assert_eq!(
            model.residual_predict_with(&x, options).unwrap_err().error_code(),
            "NOT_IMPLEMENTED"
        );
    }

    #[test]
    fn test_trend_captures_linear_target() {
        let x = DMatrix::from_fn(10, 1, |i, _| i as f64);
        let y = x.map(|v| 3.0 * v - 2.0);
        let mut model = TwoStageRegressor::new(config());
        model.fit(&Table::new(x.clone()), &Table::new(y.clone())).unwrap();

        let linear = model.linear().unwrap();
        assert!((linear.intercept()[0] + 2.0).abs() < 1e-9);
        let trend = model.detrend_predict(&Table::new(x)).unwrap();
        assert!((trend.values - y).abs().max() < 1e-9);
    }

    #[test]
    fn test_failed_refit_keeps_previous_state() {
        let x = Table::new(DMatrix::from_fn(6, 1, |i, _| i as f64));
        let y = Table::new(DMatrix::from_fn(6, 1, |i, _| (i as f64).sin()));
        let mut model = TwoStageRegressor::new(config());
        model.fit(&x, &y).unwrap();

        let before = model.predict(&x).unwrap();
        let mut broken = y.clone();
        broken.values[(0, 0)] = f64::INFINITY;
        assert!(model.fit(&x, &broken).is_err());
        assert_eq!(model.predict(&x).unwrap(), before);
    }
}
