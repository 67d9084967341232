//! emat-multitarget: multi-target Gaussian process regression with optional
//! linear de-trending.
//!
//! The crate fits surrogate models of many performance measures at once from
//! a table of experiment inputs. Each target column gets its own Gaussian
//! process with an anisotropic RBF kernel whose hyperparameters maximise the
//! log marginal likelihood.
//!
//! # Features
//!
//! - **Two-stage regression**: a joint least-squares linear trend, then GPs
//!   on the residuals ([`TwoStageRegressor`])
//! - **GP-only regression**: [`MultiTargetRegression`], the residual stage on
//!   its own
//! - **Standardization**: targets are optionally rescaled to unit variance
//!   during fit and scaled back on prediction
//! - **Labeled tables**: predictions keep the caller's row labels and target
//!   names ([`Table`])
//! - **Validation**: per-target R² and contiguous k-fold cross-validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use emat_multitarget::{RegressorConfig, Table, TwoStageRegressor};
//! use nalgebra::DMatrix;
//!
//! # fn main() -> Result<(), emat_multitarget::RegressionError> {
//! let x = Table::new(DMatrix::from_fn(20, 2, |i, j| (i * (j + 1)) as f64 / 10.0));
//! let y = Table::new(DMatrix::from_fn(20, 1, |i, _| (i as f64 / 5.0).sin()));
//!
//! let config = RegressorConfig::builder()
//!     .n_restarts_optimizer(10)
//!     .random_state(0)
//!     .build()?;
//! let mut model = TwoStageRegressor::new(config);
//! model.fit(&x, &y)?;
//!
//! let predicted = model.predict(&x)?;
//! let r2 = model.scores(&x, &y, None)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, RegressionError>`](RegressionError):
//!
//! - [`RegressionError::NotFitted`] - prediction before `fit`
//! - [`RegressionError::NotImplemented`] - `return_std` or `return_cov` requested
//! - [`RegressionError::InvalidData`] - non-finite inputs, too few rows
//! - [`RegressionError::Solver`] - every optimizer start failed
//!
//! # Thread Safety
//!
//! Fitted models are plain data and are `Send + Sync`; prediction takes
//! `&self`.

mod config;
mod cross_validation;
mod error;
mod gp;
mod kernel;
mod linear;
mod metrics;
mod multi_output;
mod regression;
mod table;
mod two_stage;

// Re-export public API
//
// Configuration types
pub use config::{RegressorConfig, RegressorConfigBuilder};
// Error types
pub use error::{RegressionError, Result};
// Labeled data
pub use table::Table;
// Model building blocks
pub use gp::GaussianProcess;
pub use kernel::{HYPERPARAMETER_LOWER, HYPERPARAMETER_UPPER, RbfKernel};
pub use linear::LinearModel;
pub use multi_output::MultiOutputGp;
// Regressors
pub use cross_validation::{Regressor, kfold};
pub use regression::{MultiTargetRegression, PredictOptions};
pub use two_stage::TwoStageRegressor;
// Metrics
pub use metrics::r2_scores;
