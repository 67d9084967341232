//! Single-output Gaussian process regression with a zero prior mean.
//!
//! Hyperparameters maximise the log marginal likelihood
//!
//! ```text
//! log p(y | X, theta) = -1/2 y^T K^-1 y - sum(ln L_ii) - n/2 ln(2 pi)
//! ```
//!
//! where `K = k(X, X) + alpha I = L L^T`. The optimizer is projected gradient
//! ascent with step doubling/halving inside the log-space bounds, run once
//! from the kernel's initial parameters and then from random restarts.

use crate::config::RegressorConfig;
use crate::error::{RegressionError, Result};
use crate::kernel::RbfKernel;
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

const LOG_2PI: f64 = 1.8378770664093453;
const MIN_STEP: f64 = 1e-10;
const RELATIVE_GAIN: f64 = 1e-10;

/// A fitted Gaussian process.
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    kernel: RbfKernel,
    x_train: DMatrix<f64>,
    /// `K^-1 y`
    weights: DVector<f64>,
    log_marginal_likelihood: f64,
}

impl GaussianProcess {
    /// Fit to `(x, y)`, optimising the kernel from `1 + n_restarts_optimizer`
    /// starting points.
    ///
    /// A start whose kernel matrix cannot be factorised is discarded; the fit
    /// fails only when every start does.
    pub fn fit(
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        fit_amplitude: bool,
        config: &RegressorConfig,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(RegressionError::shape("rows", x.nrows(), y.len()));
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(RegressionError::InvalidData(
                "need at least one row and one feature".to_string(),
            ));
        }

        let initial = RbfKernel::new(x.ncols(), fit_amplitude);
        let (lo, hi) = initial.log_bounds();
        let mut starts = vec![initial.theta()];
        for _ in 0..config.n_restarts_optimizer {
            starts.push(DVector::from_fn(initial.n_hyperparameters(), |_, _| {
                rng.gen_range(lo..hi)
            }));
        }

        let mut best: Option<(DVector<f64>, f64)> = None;
        let mut last_error = None;
        for (run, start) in starts.into_iter().enumerate() {
            match maximize(&initial, start, x, y, config) {
                Ok((theta, value)) => {
                    if best.as_ref().is_none_or(|(_, v)| value > *v) {
                        best = Some((theta, value));
                    }
                }
                Err(e) => {
                    debug!("optimizer run {run} discarded: {e}");
                    last_error = Some(e);
                }
            }
        }

        let (theta, log_marginal_likelihood) = best.ok_or_else(|| {
            last_error.unwrap_or_else(|| RegressionError::Solver("no optimizer run".to_string()))
        })?;
        let kernel = initial.with_theta(&theta);
        let chol = factorize(kernel.cross(x, x), config.alpha)?;
        let weights = chol.solve(y);

        debug!(
            "GP fitted: length scales {:?}, amplitude {:.4}, log marginal likelihood {:.4}",
            kernel.length_scales(),
            kernel.amplitude(),
            log_marginal_likelihood
        );
        Ok(Self {
            kernel,
            x_train: x.clone(),
            weights,
            log_marginal_likelihood,
        })
    }

    /// Posterior mean at every row of `x`.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        if x.ncols() != self.x_train.ncols() {
            return Err(RegressionError::shape("features", self.x_train.ncols(), x.ncols()));
        }
        Ok(self.kernel.cross(x, &self.x_train) * &self.weights)
    }

    pub fn kernel(&self) -> &RbfKernel {
        &self.kernel
    }

    pub fn log_marginal_likelihood(&self) -> f64 {
        self.log_marginal_likelihood
    }
}

fn factorize(mut k: DMatrix<f64>, alpha: f64) -> Result<Cholesky<f64, Dyn>> {
    for i in 0..k.nrows() {
        k[(i, i)] += alpha;
    }
    k.cholesky()
        .ok_or_else(|| RegressionError::Solver("kernel matrix is not positive definite".to_string()))
}

/// Log marginal likelihood and its gradient with respect to log `theta`.
pub(crate) fn log_marginal_likelihood(
    kernel: &RbfKernel,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    alpha: f64,
) -> Result<(f64, DVector<f64>)> {
    let n = x.nrows();
    let (k, gradient) = kernel.gram_with_gradient(x);
    let chol = factorize(k, alpha)?;
    let weights = chol.solve(y);
    let log_det_half: f64 = chol.l().diagonal().iter().map(|v| v.ln()).sum();
    let value = -0.5 * y.dot(&weights) - log_det_half - 0.5 * n as f64 * LOG_2PI;

    // d/dtheta_j = 1/2 tr((w w^T - K^-1) dK/dtheta_j)
    let inner = &weights * weights.transpose() - chol.inverse();
    let grad = DVector::from_iterator(
        gradient.len(),
        gradient.iter().map(|dk| 0.5 * inner.component_mul(dk).sum()),
    );
    if !value.is_finite() || grad.iter().any(|g| !g.is_finite()) {
        return Err(RegressionError::Solver(
            "log marginal likelihood is not finite".to_string(),
        ));
    }
    Ok((value, grad))
}

fn maximize(
    initial: &RbfKernel,
    start: DVector<f64>,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    config: &RegressorConfig,
) -> Result<(DVector<f64>, f64)> {
    let (lo, hi) = initial.log_bounds();
    let mut theta = start.map(|t| t.clamp(lo, hi));
    let (mut value, mut grad) =
        log_marginal_likelihood(&initial.with_theta(&theta), x, y, config.alpha)?;
    let mut step = 1.0;

    for _ in 0..config.max_iterations {
        if grad.norm() < 1e-12 {
            break;
        }
        let candidate = (&theta + &grad * step).map(|t| t.clamp(lo, hi));
        match log_marginal_likelihood(&initial.with_theta(&candidate), x, y, config.alpha) {
            Ok((v, g)) if v > value => {
                let gain = v - value;
                theta = candidate;
                value = v;
                grad = g;
                step *= 2.0;
                if gain < RELATIVE_GAIN * (1.0 + value.abs()) {
                    break;
                }
            }
            _ => {
                step *= 0.5;
                if step < MIN_STEP {
                    break;
                }
            }
        }
    }
    Ok((theta, value))
}
