//! Configuration for the multi-target regressors.
//!
//! # Example
//!
//! ```
//! use emat_multitarget::RegressorConfig;
//!
//! let config = RegressorConfig::builder()
//!     .standardize_before_fit(false)
//!     .n_restarts_optimizer(20)
//!     .random_state(0)
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::RegressionError;
use serde::{Deserialize, Serialize};

/// Settings shared by [`MultiTargetRegression`](crate::MultiTargetRegression)
/// and [`TwoStageRegressor`](crate::TwoStageRegressor).
///
/// # Validation
///
/// The builder validates the following constraints on [`build()`](RegressorConfigBuilder::build):
/// - `alpha` must be finite and non-negative
/// - `max_iterations` must be at least 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorConfig {
    /// Rescale every target column to unit variance before fitting (default: true).
    ///
    /// The scaling is inverted on prediction. When enabled the kernel has a
    /// fixed unit amplitude; otherwise a constant amplitude is fitted too.
    pub standardize_before_fit: bool,

    /// Extra optimizer runs from random starting points (default: 250).
    ///
    /// The first run always starts from the kernel's initial parameters.
    pub n_restarts_optimizer: usize,

    /// Seed for the restart sampler. `None` draws a fresh seed per fit.
    pub random_state: Option<u64>,

    /// Value added to the kernel diagonal (default: 1e-10).
    pub alpha: f64,

    /// Iteration cap for each optimizer run (default: 200).
    pub max_iterations: usize,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            standardize_before_fit: true,
            n_restarts_optimizer: 250,
            random_state: None,
            alpha: 1e-10,
            max_iterations: 200,
        }
    }
}

impl RegressorConfig {
    #[must_use]
    pub fn builder() -> RegressorConfigBuilder {
        RegressorConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), RegressionError> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(RegressionError::InvalidConfig(
                "alpha must be finite and non-negative".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(RegressionError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegressorConfigBuilder {
    config: RegressorConfig,
}

impl RegressorConfigBuilder {
    #[must_use]
    pub fn standardize_before_fit(mut self, standardize: bool) -> Self {
        self.config.standardize_before_fit = standardize;
        self
    }

    #[must_use]
    pub fn n_restarts_optimizer(mut self, restarts: usize) -> Self {
        self.config.n_restarts_optimizer = restarts;
        self
    }

    #[must_use]
    pub fn random_state(mut self, seed: u64) -> Self {
        self.config.random_state = Some(seed);
        self
    }

    #[must_use]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    #[must_use]
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.config.max_iterations = iterations;
        self
    }

    pub fn build(self) -> Result<RegressorConfig, RegressionError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegressorConfig::default();
        assert!(config.standardize_before_fit);
        assert_eq!(config.n_restarts_optimizer, 250);
        assert_eq!(config.random_state, None);
        assert_eq!(config.alpha, 1e-10);
    }

    #[test]
    fn test_builder_validation() {
        assert!(RegressorConfig::builder().alpha(-1.0).build().is_err());
        assert!(RegressorConfig::builder().alpha(f64::NAN).build().is_err());
        assert!(RegressorConfig::builder().max_iterations(0).build().is_err());

        let config = RegressorConfig::builder()
            .n_restarts_optimizer(3)
            .random_state(9)
            .build()
            .unwrap();
        assert_eq!(config.n_restarts_optimizer, 3);
        assert_eq!(config.random_state, Some(9));
    }
}
