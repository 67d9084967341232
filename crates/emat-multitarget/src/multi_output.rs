//! One independent Gaussian process per target column.

use crate::config::RegressorConfig;
use crate::error::{RegressionError, Result};
use crate::gp::GaussianProcess;
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Debug, Clone)]
pub struct MultiOutputGp {
    estimators: Vec<GaussianProcess>,
}

impl MultiOutputGp {
    /// Every column gets a fresh generator seeded from `random_state`, so a
    /// seeded fit is reproducible column by column.
    pub fn fit(
        x: &DMatrix<f64>,
        y: &DMatrix<f64>,
        fit_amplitude: bool,
        config: &RegressorConfig,
    ) -> Result<Self> {
        if y.ncols() == 0 {
            return Err(RegressionError::InvalidData("no target columns".to_string()));
        }
        let estimators = y
            .column_iter()
            .map(|column| {
                let mut rng = match config.random_state {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                GaussianProcess::fit(x, &column.into_owned(), fit_amplitude, config, &mut rng)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { estimators })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let columns = self
            .estimators
            .iter()
            .map(|gp| gp.predict(x))
            .collect::<Result<Vec<_>>>()?;
        Ok(DMatrix::from_columns(&columns))
    }

    pub fn estimators(&self) -> &[GaussianProcess] {
        &self.estimators
    }

    pub fn n_targets(&self) -> usize {
        self.estimators.len()
    }
}
