//! Selection-Driven Exploration Library
//!
//! Linked charts over a table of experiment results, built with Rust and Polars.
//!
//! # Overview
//!
//! A [`SelectionBox`] holds per-column thresholds; the rows satisfying all
//! of them are the current selection. Every chart shows the unconditional
//! distribution of a column next to the distribution of the selected rows:
//!
//! - **Histograms**: equal-width bins fixed on first request
//! - **Frequencies**: counts per category label for boolean and categorical columns
//! - **KDE curves**: Gaussian kernel densities sharing one bandwidth factor
//! - **Two-way scatter**: inside/outside point groups with the box drawn as a rectangle
//! - **Selectors**: range sliders and toggle buttons that edit the box
//!
//! Chart output is pushed to a [`RedrawSink`] as [`RedrawUpdate`] values, so
//! any host (a notebook bridge, a web UI, the bundled CLI) can render them.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use emat_explore::{Explore, RecordingSink, Scope, SelectionBox};
//! use polars::prelude::*;
//! use std::sync::Arc;
//!
//! let scope = Scope::from_json(&std::fs::read_to_string("scope.json")?)?;
//! let data = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("results.csv".into()))?
//!     .finish()?;
//!
//! let sink = Arc::new(RecordingSink::new());
//! let mut explore = Explore::new(scope, data, None, sink.clone())?;
//!
//! explore.histogram_chart("fuel_price", None);
//! explore.kde_chart("net_benefits");
//! explore.drag_slider("fuel_price", 2.5, 4.0)?;
//!
//! println!("{}", explore.status().message());
//! ```
//!
//! # Row expressions
//!
//! A scatter view can take its selection from a boolean expression instead
//! of the box:
//!
//! ```rust,ignore
//! use emat_explore::SelectionSource;
//!
//! let view = explore.two_way("main", false)?;
//! view.set_x("fuel_price")?;
//! view.set_y("net_benefits")?;
//! view.set_selection_source(SelectionSource::Expression("net_benefits > 0".into()))?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod explore;
pub mod expression;
pub mod scatter;
pub mod scope;
pub mod selection_box;
pub mod selector;
pub mod sink;
pub mod stats;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cache::{DEFAULT_KDE_POINTS, SelectionChartCache};
pub use config::{ConfigValidationError, ExploreConfig, ExploreConfigBuilder, ScatterConfig};
pub use error::{ExploreError, Result as ExploreResult, ResultExt};
pub use explore::{ChartPanel, ChartStyle, Dashboard, Explore};
pub use expression::{RowExpression, evaluate_expression};
pub use scatter::{
    AxisSource, PointGroup, Rect, ScatterFrame, ScatterSelectionView, SelectionSource,
    marker_opacity,
};
pub use scope::{Measure, Parameter, ParameterRole, Scope, VariableType};
pub use selection_box::{SelectionBox, Threshold};
pub use selector::{RangeSelector, SNAP_TOLERANCE, Selector, ToggleSelector};
pub use sink::{ClosureRedrawSink, NullSink, RecordingSink, RedrawSink, RedrawUpdate};
pub use stats::{Bandwidth, GaussianKde};
pub use types::{Category, FrequencyCounts, HistogramCounts, KdeCurves, Mask, StatusSummary};
