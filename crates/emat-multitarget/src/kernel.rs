//! Anisotropic squared-exponential (RBF) kernel with an optional constant
//! amplitude.
//!
//! Hyperparameters are handled in log space: `theta = [ln l_1, .., ln l_d]`
//! followed by `ln sigma2` when the amplitude is free.

use nalgebra::{DMatrix, DVector};

/// Lower bound for every hyperparameter (not its log).
pub const HYPERPARAMETER_LOWER: f64 = 1e-5;
/// Upper bound for every hyperparameter (not its log).
pub const HYPERPARAMETER_UPPER: f64 = 1e5;

#[derive(Debug, Clone, PartialEq)]
pub struct RbfKernel {
    length_scales: Vec<f64>,
    /// `None` means a fixed unit amplitude.
    amplitude: Option<f64>,
}

impl RbfKernel {
    /// Unit length scales in every dimension.
    pub fn new(dims: usize, fit_amplitude: bool) -> Self {
        Self {
            length_scales: vec![1.0; dims],
            amplitude: fit_amplitude.then_some(1.0),
        }
    }

    pub fn length_scales(&self) -> &[f64] {
        &self.length_scales
    }

    /// Signal variance; 1.0 when not fitted.
    pub fn amplitude(&self) -> f64 {
        self.amplitude.unwrap_or(1.0)
    }

    pub fn dims(&self) -> usize {
        self.length_scales.len()
    }

    pub fn n_hyperparameters(&self) -> usize {
        self.dims() + usize::from(self.amplitude.is_some())
    }

    pub fn theta(&self) -> DVector<f64> {
        let mut theta: Vec<f64> = self.length_scales.iter().map(|l| l.ln()).collect();
        if let Some(a) = self.amplitude {
            theta.push(a.ln());
        }
        DVector::from_vec(theta)
    }

    /// Kernel with the hyperparameters `exp(theta)`.
    pub fn with_theta(&self, theta: &DVector<f64>) -> Self {
        let dims = self.dims();
        Self {
            length_scales: theta.iter().take(dims).map(|t| t.exp()).collect(),
            amplitude: self.amplitude.map(|_| theta[dims].exp()),
        }
    }

    /// `(lower, upper)` bounds in log space.
    pub fn log_bounds(&self) -> (f64, f64) {
        (HYPERPARAMETER_LOWER.ln(), HYPERPARAMETER_UPPER.ln())
    }

    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        let sq: f64 = a
            .iter()
            .zip(b)
            .zip(&self.length_scales)
            .map(|((x, y), l)| ((x - y) / l).powi(2))
            .sum();
        self.amplitude() * (-0.5 * sq).exp()
    }

    /// `K[i, j] = k(a_i, b_j)`.
    pub fn cross(&self, a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
        let rows_a: Vec<Vec<f64>> = rows(a);
        let rows_b: Vec<Vec<f64>> = rows(b);
        DMatrix::from_fn(a.nrows(), b.nrows(), |i, j| self.eval(&rows_a[i], &rows_b[j]))
    }

    /// Gram matrix of `x` with itself plus the gradient of every entry with
    /// respect to each log hyperparameter.
    pub fn gram_with_gradient(&self, x: &DMatrix<f64>) -> (DMatrix<f64>, Vec<DMatrix<f64>>) {
        let n = x.nrows();
        let k = self.cross(x, x);
        let mut gradient = Vec::with_capacity(self.n_hyperparameters());
        for (d, l) in self.length_scales.iter().enumerate() {
            let col = x.column(d);
            gradient.push(DMatrix::from_fn(n, n, |i, j| {
                k[(i, j)] * ((col[i] - col[j]) / l).powi(2)
            }));
        }
        if self.amplitude.is_some() {
            gradient.push(k.clone());
        }
        (k, gradient)
    }
}

fn rows(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter().map(|r| r.iter().copied().collect()).collect()
}
