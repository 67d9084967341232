//! The common regressor interface and k-fold cross-validation.

use crate::config::RegressorConfig;
use crate::error::{RegressionError, Result};
use crate::metrics::r2_scores;
use crate::table::Table;
use nalgebra::DMatrix;
use tracing::debug;

/// A multi-target regressor that can be rebuilt from its configuration.
pub trait Regressor {
    fn from_config(config: RegressorConfig) -> Self
    where
        Self: Sized;

    fn config(&self) -> &RegressorConfig;

    fn fit(&mut self, x: &Table, y: &Table) -> Result<()>;

    fn predict(&self, x: &Table) -> Result<Table>;

    /// Per-column R^2 of `predict(x)` against `y`.
    fn scores(&self, x: &Table, y: &Table, sample_weight: Option<&[f64]>) -> Result<Vec<f64>> {
        let predicted = self.predict(x)?;
        r2_scores(&y.values, &predicted.values, sample_weight)
    }

    /// R^2 of every target on every held-out fold, `folds x n_targets`.
    ///
    /// Each fold is scored by a fresh estimator built from this one's
    /// configuration; `self` is left untouched.
    fn cross_val_scores(&self, x: &Table, y: &Table, folds: usize) -> Result<DMatrix<f64>>
    where
        Self: Sized,
    {
        if x.nrows() != y.nrows() {
            return Err(RegressionError::shape("rows", x.nrows(), y.nrows()));
        }
        let splits = kfold(x.nrows(), folds)?;
        let mut scores = DMatrix::zeros(folds, y.ncols());
        for (fold, (train, test)) in splits.iter().enumerate() {
            let mut model = Self::from_config(self.config().clone());
            model.fit(&x.select_rows(train), &y.select_rows(train))?;
            let fold_scores = model.scores(&x.select_rows(test), &y.select_rows(test), None)?;
            debug!("fold {fold}: R^2 {fold_scores:?}");
            for (j, s) in fold_scores.into_iter().enumerate() {
                scores[(fold, j)] = s;
            }
        }
        Ok(scores)
    }
}

/// Contiguous `(train, test)` row splits. The first `n % folds` test blocks
/// get one extra row.
///
/// Every test block needs at least two rows to be scored, so `folds` must
/// lie in `2..=n / 2`.
pub fn kfold(n: usize, folds: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if folds < 2 || folds > n / 2 {
        return Err(RegressionError::InvalidConfig(format!(
            "folds must be between 2 and half the number of rows ({}), got {folds}",
            n / 2
        )));
    }
    let base = n / folds;
    let extra = n % folds;
    let mut start = 0;
    let mut splits = Vec::with_capacity(folds);
    for fold in 0..folds {
        let size = base + usize::from(fold < extra);
        let test: Vec<usize> = (start..start + size).collect();
        let train: Vec<usize> = (0..start).chain(start + size..n).collect();
        splits.push((train, test));
        start += size;
    }
    Ok(splits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kfold_sizes_and_order() {
        let splits = kfold(10, 3).unwrap();
        let tests: Vec<Vec<usize>> = splits.iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(tests, vec![vec![0, 1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]);
        assert_eq!(splits[1].0, vec![0, 1, 2, 3, 7, 8, 9]);
    }

    #[test]
    fn test_kfold_rejects_bad_fold_counts() {
        assert!(kfold(10, 1).is_err());
        assert!(kfold(3, 4).is_err());
        assert!(kfold(3, 2).is_err());
        assert!(kfold(6, 6).is_err());
        assert!(kfold(6, 4).is_err());
        assert!(kfold(1, 2).is_err());
    }

    #[test]
    fn test_kfold_half_rows_is_the_limit() {
        let splits = kfold(6, 3).unwrap();
        assert!(splits.iter().all(|(_, test)| test.len() == 2));
        let splits = kfold(7, 3).unwrap();
        let sizes: Vec<usize> = splits.iter().map(|(_, t)| t.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
        assert_eq!(kfold(4, 2).unwrap().len(), 2);
    }
}
