//! Ordinary least squares with an intercept, fitted jointly for all targets.

use crate::error::{RegressionError, Result};
use nalgebra::DMatrix;
use tracing::debug;

const SVD_EPSILON: f64 = 1e-12;

/// Linear de-trending model `Y ≈ 1·b + X·W`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    /// `(n_features + 1) × n_targets`; the first row is the intercept.
    coefficients: DMatrix<f64>,
}

impl LinearModel {
    /// Least-squares fit through the SVD of the design matrix, so rank
    /// deficient inputs get the minimum-norm solution.
    pub fn fit(x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(RegressionError::shape("rows", x.nrows(), y.nrows()));
        }
        if x.nrows() == 0 {
            return Err(RegressionError::InvalidData("no rows to fit".to_string()));
        }
        let design = with_intercept(x);
        let coefficients = design
            .svd(true, true)
            .solve(y, SVD_EPSILON)
            .map_err(|e| RegressionError::Solver(e.to_string()))?;
        debug!(
            "fitted linear trend on {} rows, {} features, {} targets",
            x.nrows(),
            x.ncols(),
            y.ncols()
        );
        Ok(Self { coefficients })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if x.ncols() + 1 != self.coefficients.nrows() {
            return Err(RegressionError::shape(
                "features",
                self.coefficients.nrows() - 1,
                x.ncols(),
            ));
        }
        Ok(with_intercept(x) * &self.coefficients)
    }

    pub fn intercept(&self) -> Vec<f64> {
        self.coefficients.row(0).iter().copied().collect()
    }

    /// Slopes, `n_features × n_targets`.
    pub fn slopes(&self) -> DMatrix<f64> {
        self.coefficients
            .rows(1, self.coefficients.nrows() - 1)
            .into_owned()
    }
}

fn with_intercept(x: &DMatrix<f64>) -> DMatrix<f64> {
    let mut design = DMatrix::from_element(x.nrows(), x.ncols() + 1, 1.0);
    design.columns_mut(1, x.ncols()).copy_from(x);
    design
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_plane() {
        let x = DMatrix::from_row_slice(5, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 2.0, 1.0, 1.0, 3.0]);
        // y0 = 1 + 2a - b, y1 = -3 + 0.5b
        let y = DMatrix::from_fn(5, 2, |i, j| {
            let (a, b) = (x[(i, 0)], x[(i, 1)]);
            if j == 0 { 1.0 + 2.0 * a - b } else { -3.0 + 0.5 * b }
        });
        let model = LinearModel::fit(&x, &y).unwrap();
        let intercept = model.intercept();
        assert!((intercept[0] - 1.0).abs() < 1e-9);
        assert!((intercept[1] + 3.0).abs() < 1e-9);
        let slopes = model.slopes();
        assert!((slopes[(0, 0)] - 2.0).abs() < 1e-9);
        assert!((slopes[(1, 0)] + 1.0).abs() < 1e-9);
        assert!((slopes[(1, 1)] - 0.5).abs() < 1e-9);

        let predicted = model.predict(&x).unwrap();
        assert!((predicted - y).abs().max() < 1e-9);
    }

    #[test]
    fn test_shape_errors() {
        let x = DMatrix::zeros(3, 2);
        assert_eq!(
            LinearModel::fit(&x, &DMatrix::zeros(4, 1)).unwrap_err().error_code(),
            "SHAPE_MISMATCH"
        );
        let model = LinearModel::fit(
            &DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]),
            &DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]),
        )
        .unwrap();
        assert!(model.predict(&x).is_err());
    }
}
