//! The exploration controller.
//!
//! [`Explore`] ties a [`Scope`], a dataset and a [`SelectionBox`] together.
//! It materializes charts on request, builds one selector per thresholded
//! column, and recomputes every chart from the box whenever a selector
//! moves. All output goes to the [`RedrawSink`].

use crate::cache::SelectionChartCache;
use crate::config::ExploreConfig;
use crate::error::{ExploreError, Result};
use crate::scatter::ScatterSelectionView;
use crate::scope::{Scope, VariableType};
use crate::selection_box::SelectionBox;
use crate::selector::{RangeSelector, Selector, ToggleSelector};
use crate::sink::{RedrawSink, RedrawUpdate};
use crate::stats::{Bandwidth, min_max};
use crate::types::{Category, Mask, StatusSummary};
use crate::utils::{category_values, check_mask, column_series, count_selected, finite_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Chart flavour for continuous columns in a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStyle {
    #[default]
    Hist,
    Kde,
}

/// A labelled chart, optionally with the selector that drives it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub label: String,
    pub chart: RedrawUpdate,
    pub selector: Option<Selector>,
}

/// Status plus selectors for levers and uncertainties and viewers for
/// measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub status: StatusSummary,
    pub levers: Vec<ChartPanel>,
    pub uncertainties: Vec<ChartPanel>,
    pub measures: Vec<ChartPanel>,
}

/// Interactive exploration of one dataset under one box.
pub struct Explore {
    scope: Scope,
    selection_box: SelectionBox,
    config: ExploreConfig,
    sink: Arc<dyn RedrawSink>,
    cache: SelectionChartCache,
    selection: Mask,
    histograms: BTreeMap<String, usize>,
    frequencies: BTreeMap<String, Vec<Category>>,
    kdes: BTreeSet<String>,
    selectors: BTreeMap<String, Selector>,
    two_way: BTreeMap<String, ScatterSelectionView>,
}

impl std::fmt::Debug for Explore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explore")
            .field("scope", &self.scope.name)
            .field("box", &self.selection_box.name)
            .field("rows", &self.cache.rows())
            .field("histograms", &self.histograms.keys().collect::<Vec<_>>())
            .field("frequencies", &self.frequencies.keys().collect::<Vec<_>>())
            .field("kdes", &self.kdes)
            .finish_non_exhaustive()
    }
}

impl Explore {
    /// Explore `data` with default settings. Without a box an empty one
    /// named `"explore"` is used.
    pub fn new(
        scope: Scope,
        data: DataFrame,
        selection_box: Option<SelectionBox>,
        sink: Arc<dyn RedrawSink>,
    ) -> Result<Self> {
        Self::with_config(scope, data, selection_box, sink, ExploreConfig::default())
    }

    pub fn with_config(
        scope: Scope,
        data: DataFrame,
        selection_box: Option<SelectionBox>,
        sink: Arc<dyn RedrawSink>,
        config: ExploreConfig,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ExploreError::InvalidConfig(e.to_string()))?;
        let selection_box = selection_box.unwrap_or_else(|| SelectionBox::new("explore"));
        let selection = selection_box.inside(&data)?;
        info!(
            "exploring {} rows under box '{}'",
            data.height(),
            selection_box.name
        );
        let explore = Self {
            scope,
            selection_box,
            cache: SelectionChartCache::with_kde_points(data, config.kde_points),
            config,
            sink,
            selection,
            histograms: BTreeMap::new(),
            frequencies: BTreeMap::new(),
            kdes: BTreeSet::new(),
            selectors: BTreeMap::new(),
            two_way: BTreeMap::new(),
        };
        explore.status();
        Ok(explore)
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn data(&self) -> &DataFrame {
        self.cache.data()
    }

    pub fn selection_box(&self) -> &SelectionBox {
        &self.selection_box
    }

    /// Rows currently inside the box.
    pub fn selection(&self) -> &Mask {
        &self.selection
    }

    /// Selected versus total rows; also pushed to the sink.
    pub fn status(&self) -> StatusSummary {
        let status = summarize(&self.selection);
        self.sink.redraw(RedrawUpdate::Status(status));
        status
    }

    // ==================== charts ====================

    /// Histogram of `column`, or its frequency chart when the column is
    /// boolean or categorical. `bins` defaults to the configured count and
    /// only applies to the first request for a column.
    pub fn histogram_chart(&mut self, column: &str, bins: Option<usize>) -> Option<RedrawUpdate> {
        advisory(column, self.try_histogram_chart(column, bins))
    }

    /// Frequency chart of a boolean or categorical column.
    pub fn frequency_chart(&mut self, column: &str) -> Option<RedrawUpdate> {
        advisory(column, self.try_frequency_chart(column))
    }

    /// Kernel density chart of a numeric column.
    pub fn kde_chart(&mut self, column: &str) -> Option<RedrawUpdate> {
        advisory(column, self.try_kde_chart(column))
    }

    fn try_histogram_chart(&mut self, column: &str, bins: Option<usize>) -> Result<RedrawUpdate> {
        if self.variable_type(column)?.is_discrete_choice() {
            return self.try_frequency_chart(column);
        }
        let bins = match self.histograms.get(column) {
            Some(bins) => *bins,
            None => bins.unwrap_or(self.config.default_bins),
        };
        let counts = self
            .cache
            .histogram(column, bins, Some(&self.selection))?;
        self.histograms.insert(column.to_string(), bins);
        Ok(self.draw(RedrawUpdate::Histogram {
            column: column.to_string(),
            counts,
        }))
    }

    fn try_frequency_chart(&mut self, column: &str) -> Result<RedrawUpdate> {
        self.variable_type(column)?;
        let labels = match self.frequencies.get(column) {
            Some(labels) => labels.clone(),
            None => self.category_labels(column)?,
        };
        let counts = self
            .cache
            .frequencies(column, &labels, Some(&self.selection))?;
        self.frequencies.insert(column.to_string(), labels);
        Ok(self.draw(RedrawUpdate::Frequencies {
            column: column.to_string(),
            counts,
        }))
    }

    fn try_kde_chart(&mut self, column: &str) -> Result<RedrawUpdate> {
        self.variable_type(column)?;
        let curves = self
            .cache
            .kde(column, Some(&self.selection), Bandwidth::Scott)?;
        self.kdes.insert(column.to_string());
        Ok(self.draw(RedrawUpdate::Kde {
            column: column.to_string(),
            curves,
        }))
    }

    /// Recompute status, every materialized chart and every two-way view.
    ///
    /// `selection` is taken as the new mask when given, otherwise the
    /// mask is recomputed from the box.
    pub fn refresh_all(&mut self, selection: Option<Mask>) -> Result<()> {
        let selection = match selection {
            Some(mask) => {
                check_mask(&mask, self.cache.rows())?;
                mask
            }
            None => self.selection_box.inside(self.cache.data())?,
        };

        // Nothing reaches the sink until every chart has been recomputed.
        let mut updates = Vec::with_capacity(
            1 + self.histograms.len() + self.frequencies.len() + self.kdes.len(),
        );
        updates.push(RedrawUpdate::Status(summarize(&selection)));
        for (column, bins) in &self.histograms {
            let counts = self.cache.histogram(column, *bins, Some(&selection))?;
            updates.push(RedrawUpdate::Histogram {
                column: column.clone(),
                counts,
            });
        }
        for (column, labels) in &self.frequencies {
            let counts = self.cache.frequencies(column, labels, Some(&selection))?;
            updates.push(RedrawUpdate::Frequencies {
                column: column.clone(),
                counts,
            });
        }
        for column in &self.kdes {
            let curves = self.cache.kde(column, Some(&selection), Bandwidth::Scott)?;
            updates.push(RedrawUpdate::Kde {
                column: column.clone(),
                curves,
            });
        }

        self.selection = selection;
        for update in updates {
            self.sink.redraw(update);
        }
        for view in self.two_way.values_mut() {
            view.on_box_changed(&self.selection_box, Some(&self.selection))?;
        }
        debug!(
            "refreshed {} charts and {} two-way views",
            self.histograms.len() + self.frequencies.len() + self.kdes.len(),
            self.two_way.len()
        );
        Ok(())
    }

    // ==================== selectors ====================

    /// The selector for `column`, built on first use.
    pub fn selector(&mut self, column: &str) -> Result<&Selector> {
        self.selector_with_domain(column, None, None)
    }

    /// Like [`selector`](Self::selector), with explicit slider ends taking
    /// precedence over the scope and the data. Overrides are ignored once
    /// the selector exists.
    pub fn selector_with_domain(
        &mut self,
        column: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<&Selector> {
        if !self.selectors.contains_key(column) {
            let selector = self.build_selector(column, min, max)?;
            debug!("built selector for '{}'", column);
            self.selectors.insert(column.to_string(), selector);
        }
        self.selectors
            .get(column)
            .ok_or_else(|| ExploreError::ColumnNotFound(column.to_string()))
    }

    /// Move the range slider of `column` and refresh everything.
    pub fn drag_slider(&mut self, column: &str, low: f64, high: f64) -> Result<()> {
        self.selector(column)?;
        match self.selectors.get_mut(column) {
            Some(Selector::Range(slider)) => slider.drag(low, high, &mut self.selection_box),
            _ => {
                return Err(ExploreError::WrongSelector {
                    column: column.to_string(),
                    expected: "range",
                });
            }
        }
        self.refresh_all(None)
    }

    /// Replace the allowed set of `column` and refresh everything.
    pub fn toggle(&mut self, column: &str, allowed: BTreeSet<Category>) -> Result<()> {
        self.selector(column)?;
        match self.selectors.get_mut(column) {
            Some(Selector::Toggle(buttons)) => buttons.toggle(allowed, &mut self.selection_box),
            _ => {
                return Err(ExploreError::WrongSelector {
                    column: column.to_string(),
                    expected: "toggle",
                });
            }
        }
        self.refresh_all(None)
    }

    /// Swap in a new box. Existing selectors are dropped so they are
    /// rebuilt against the new thresholds.
    pub fn set_box(&mut self, selection_box: SelectionBox) -> Result<()> {
        info!("switching to box '{}'", selection_box.name);
        self.selection_box = selection_box;
        self.selectors.clear();
        self.refresh_all(None)
    }

    fn build_selector(
        &self,
        column: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Selector> {
        let selector = match self.variable_type(column)? {
            VariableType::Boolean => Selector::Toggle(ToggleSelector::new(
                column,
                vec![Category::Bool(false), Category::Bool(true)],
                self.selection_box.get_allowed(column),
            )),
            VariableType::Categorical => Selector::Toggle(ToggleSelector::new(
                column,
                self.category_labels(column)?,
                self.selection_box.get_allowed(column),
            )),
            VariableType::Integer => {
                let (lo, hi) = self.domain(column, min, max)?;
                Selector::Range(RangeSelector::new(
                    column,
                    lo,
                    hi,
                    true,
                    self.config.slider_steps,
                    self.selection_box.get_bounds(column),
                ))
            }
            VariableType::Continuous => {
                let (lo, hi) = self.domain(column, min, max)?;
                Selector::Range(RangeSelector::new(
                    column,
                    lo,
                    hi,
                    false,
                    self.config.slider_steps,
                    self.selection_box.get_bounds(column),
                ))
            }
        };
        Ok(selector)
    }

    /// Slider ends: overrides, then the scope (not for measures), then the
    /// observed data, then the box's current bounds.
    fn domain(&self, column: &str, min: Option<f64>, max: Option<f64>) -> Result<(f64, f64)> {
        let (mut lo, mut hi) = (min, max);
        if !self.scope.is_measure(column) {
            let (scope_lo, scope_hi) = self.scope.bounds(column);
            lo = lo.or(scope_lo);
            hi = hi.or(scope_hi);
        }
        if lo.is_none() || hi.is_none() {
            if let Ok(series) = column_series(self.cache.data(), column) {
                if let Some((data_lo, data_hi)) = min_max(&finite_values(series)?) {
                    lo = lo.or(Some(data_lo));
                    hi = hi.or(Some(data_hi));
                }
            }
        }
        let (box_lo, box_hi) = self.selection_box.get_bounds(column);
        let lo = lo.or(box_lo).ok_or_else(|| ExploreError::MissingDomain {
            column: column.to_string(),
            bound: "min",
        })?;
        let hi = hi.or(box_hi).ok_or_else(|| ExploreError::MissingDomain {
            column: column.to_string(),
            bound: "max",
        })?;
        Ok((lo, hi))
    }

    // ==================== panels ====================

    /// Charts with selectors for the given columns.
    pub fn selectors<S: AsRef<str>>(&mut self, include: &[S], style: ChartStyle) -> Vec<ChartPanel> {
        self.panels(include, true, style)
    }

    /// Charts without selectors; an empty `include` means every measure.
    pub fn viewers<S: AsRef<str>>(&mut self, include: &[S], style: ChartStyle) -> Vec<ChartPanel> {
        if include.is_empty() {
            let measures = self.scope.get_measure_names();
            return self.panels(&measures, false, style);
        }
        self.panels(include, false, style)
    }

    pub fn lever_selectors(&mut self, style: ChartStyle) -> Vec<ChartPanel> {
        let names = self.scope.get_lever_names();
        self.panels(&names, true, style)
    }

    pub fn lever_viewers(&mut self, style: ChartStyle) -> Vec<ChartPanel> {
        let names = self.scope.get_lever_names();
        self.panels(&names, false, style)
    }

    pub fn uncertainty_selectors(&mut self, style: ChartStyle) -> Vec<ChartPanel> {
        let names = self.scope.get_uncertainty_names();
        self.panels(&names, true, style)
    }

    pub fn uncertainty_viewers(&mut self, style: ChartStyle) -> Vec<ChartPanel> {
        let names = self.scope.get_uncertainty_names();
        self.panels(&names, false, style)
    }

    pub fn measure_selectors(&mut self, style: ChartStyle) -> Vec<ChartPanel> {
        let names = self.scope.get_measure_names();
        self.panels(&names, true, style)
    }

    pub fn measure_viewers(&mut self, style: ChartStyle) -> Vec<ChartPanel> {
        let names = self.scope.get_measure_names();
        self.panels(&names, false, style)
    }

    /// Lever and uncertainty selectors as histograms, measures as viewers
    /// in `measure_style`.
    pub fn complete(&mut self, measure_style: ChartStyle) -> Dashboard {
        Dashboard {
            status: self.status(),
            levers: self.lever_selectors(ChartStyle::Hist),
            uncertainties: self.uncertainty_selectors(ChartStyle::Hist),
            measures: self.measure_viewers(measure_style),
        }
    }

    fn panels<S: AsRef<str>>(
        &mut self,
        include: &[S],
        with_selector: bool,
        style: ChartStyle,
    ) -> Vec<ChartPanel> {
        let mut panels = Vec::with_capacity(include.len());
        for column in include.iter().map(AsRef::as_ref) {
            if !self.scope.contains(column) {
                warn!("{} not in scope", column);
            } else if column_series(self.cache.data(), column).is_err() {
                warn!("{} not in data", column);
            } else {
                match self.panel(column, with_selector, style) {
                    Ok(panel) => panels.push(panel),
                    Err(e) => warn!("skipping panel for '{}': {}", column, e),
                }
            }
        }
        panels
    }

    fn panel(&mut self, column: &str, with_selector: bool, style: ChartStyle) -> Result<ChartPanel> {
        let selector = if with_selector {
            Some(self.selector(column)?.clone())
        } else {
            None
        };
        let discrete = self.variable_type(column)?.is_discrete_choice();
        let chart = match style {
            ChartStyle::Kde if !discrete => self.try_kde_chart(column)?,
            _ => self.try_histogram_chart(column, None)?,
        };
        Ok(ChartPanel {
            label: column.to_string(),
            chart,
            selector,
        })
    }

    // ==================== two-way views ====================

    /// The scatter view stored under `key`, created on first use.
    /// `reset` discards an existing view and builds a fresh one.
    pub fn two_way(&mut self, key: &str, reset: bool) -> Result<&mut ScatterSelectionView> {
        if reset && self.two_way.remove(key).is_some() {
            debug!("reset two-way view '{}'", key);
        }
        match self.two_way.entry(key.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let view = ScatterSelectionView::new(
                    self.cache.data().clone(),
                    Some(self.selection_box.clone()),
                    Some(self.scope.clone()),
                    self.config.scatter.clone(),
                    self.sink.clone(),
                )?
                .named(key);
                view.redraw();
                Ok(entry.insert(view))
            }
        }
    }

    pub fn two_way_keys(&self) -> Vec<&str> {
        self.two_way.keys().map(String::as_str).collect()
    }

    // ==================== helpers ====================

    fn draw(&self, update: RedrawUpdate) -> RedrawUpdate {
        self.sink.redraw(update.clone());
        update
    }

    /// Declared type of a column that is both in the scope and in the data.
    pub fn variable_type(&self, column: &str) -> Result<VariableType> {
        let dtype = self.scope.get_dtype(column)?;
        column_series(self.cache.data(), column)?;
        Ok(dtype)
    }

    /// Labels for a frequency chart: the scope's categories, `[false, true]`
    /// for booleans, otherwise the distinct observed values.
    fn category_labels(&self, column: &str) -> Result<Vec<Category>> {
        let declared = self.scope.get_cat_values(column).unwrap_or_default();
        if !declared.is_empty() {
            return Ok(declared);
        }
        if self.variable_type(column)? == VariableType::Boolean {
            return Ok(vec![Category::Bool(false), Category::Bool(true)]);
        }
        let observed: BTreeSet<Category> =
            category_values(column_series(self.cache.data(), column)?)?
                .into_iter()
                .flatten()
                .collect();
        Ok(observed.into_iter().collect())
    }
}

fn summarize(selection: &Mask) -> StatusSummary {
    StatusSummary {
        selected: count_selected(selection),
        total: selection.len(),
    }
}

fn advisory(column: &str, result: Result<RedrawUpdate>) -> Option<RedrawUpdate> {
    match result {
        Ok(update) => Some(update),
        Err(e) if e.is_advisory() => {
            warn!("no chart for '{}': {}", column, e);
            None
        }
        Err(e) => {
            error!("chart for '{}' failed: {}", column, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{Measure, Parameter, ParameterRole};
    use crate::sink::RecordingSink;
    use crate::utils::mask_to_vec;
    use pretty_assertions::assert_eq;

    fn sample_scope() -> Scope {
        Scope::new("test")
            .with_parameter(Parameter::continuous("A", ParameterRole::Uncertainty, 0.0, 10.0))
            .with_parameter(Parameter::integer("N", ParameterRole::Lever, 1, 4))
            .with_parameter(Parameter::categorical(
                "C",
                ParameterRole::Lever,
                vec!["x".into(), "y".into(), "z".into()],
            ))
            .with_parameter(Parameter::boolean("F", ParameterRole::Uncertainty))
            .with_measure(Measure::new("M"))
    }

    fn sample_df() -> DataFrame {
        df! {
            "A" => &[0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
            "N" => &[1i64, 2, 3, 4, 1, 2, 3, 4, 1, 2],
            "C" => &["x", "y", "z", "x", "y", "z", "x", "y", "z", "x"],
            "F" => &[true, false, true, false, true, false, true, false, true, false],
            "M" => &[10.0f64, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0],
        }
        .unwrap()
    }

    fn explore() -> (Explore, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let explore = Explore::new(sample_scope(), sample_df(), None, sink.clone()).unwrap();
        (explore, sink)
    }

    fn histogram_selected(update: Option<RedrawUpdate>) -> Vec<usize> {
        match update {
            Some(RedrawUpdate::Histogram { counts, .. }) => counts.selected,
            other => panic!("expected a histogram, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_status() {
        let (explore, sink) = explore();
        assert_eq!(explore.selection_box().name, "explore");
        assert_eq!(
            sink.last_for("status"),
            Some(RedrawUpdate::Status(StatusSummary {
                selected: 10,
                total: 10
            }))
        );
    }

    #[test]
    fn test_histogram_redirects_discrete_columns() {
        let (mut explore, _) = explore();
        let chart = explore.histogram_chart("C", None).unwrap();
        match chart {
            RedrawUpdate::Frequencies { counts, .. } => {
                assert_eq!(counts.labels, vec!["x".into(), "y".into(), "z".into()]);
                assert_eq!(counts.unconditional, vec![4, 3, 3]);
            }
            other => panic!("expected frequencies, got {other:?}"),
        }
        match explore.histogram_chart("F", None).unwrap() {
            RedrawUpdate::Frequencies { counts, .. } => {
                assert_eq!(counts.labels, vec![Category::Bool(false), Category::Bool(true)]);
                assert_eq!(counts.unconditional, vec![5, 5]);
            }
            other => panic!("expected frequencies, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_column_is_advisory() {
        let (mut explore, _) = explore();
        assert!(explore.histogram_chart("missing", None).is_none());
        assert!(explore.kde_chart("missing").is_none());
        assert!(explore.frequency_chart("missing").is_none());
    }

    fn narrow_explore() -> (Explore, Arc<RecordingSink>) {
        let scope = Scope::new("narrow")
            .with_parameter(Parameter::continuous("A", ParameterRole::Uncertainty, 0.0, 10.0))
            .with_measure(Measure::new("G"));
        let data = df! {
            "A" => &[0.0f64, 2.0, 4.0, 6.0, 8.0],
            "X" => &[1.0f64, 2.0, 3.0, 4.0, 5.0],
        }
        .unwrap();
        let sink = Arc::new(RecordingSink::new());
        let explore = Explore::new(scope, data, None, sink.clone()).unwrap();
        (explore, sink)
    }

    #[test]
    fn test_columns_outside_scope_get_no_chart() {
        let (mut explore, sink) = narrow_explore();
        sink.take();
        assert!(explore.histogram_chart("X", None).is_none());
        assert!(explore.kde_chart("X").is_none());
        assert!(explore.frequency_chart("X").is_none());
        assert!(sink.take().is_empty());

        for err in [
            explore.try_histogram_chart("X", None).unwrap_err(),
            explore.try_kde_chart("X").unwrap_err(),
            explore.try_frequency_chart("X").unwrap_err(),
        ] {
            assert_eq!(err.error_code(), "NOT_IN_SCOPE");
        }
        assert_eq!(explore.variable_type("X").unwrap_err().error_code(), "NOT_IN_SCOPE");
    }

    #[test]
    fn test_scoped_columns_missing_from_data_get_no_chart() {
        let (mut explore, _) = narrow_explore();
        assert!(explore.histogram_chart("G", None).is_none());
        assert!(explore.kde_chart("G").is_none());
        assert!(explore.frequency_chart("G").is_none());
        for err in [
            explore.try_histogram_chart("G", None).unwrap_err(),
            explore.try_kde_chart("G").unwrap_err(),
            explore.try_frequency_chart("G").unwrap_err(),
        ] {
            assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
        }
    }

    #[test]
    fn test_refresh_skips_rejected_columns() {
        let (mut explore, sink) = narrow_explore();
        explore.histogram_chart("A", Some(4)).unwrap();
        explore.histogram_chart("X", None);
        explore.kde_chart("missing");
        explore.frequency_chart("G");
        sink.take();

        explore.drag_slider("A", 3.0, 10.0).unwrap();
        let targets: Vec<String> = sink.take().iter().map(|u| u.target()).collect();
        assert_eq!(targets, vec!["status", "histogram:A"]);
        assert_eq!(explore.status(), StatusSummary { selected: 3, total: 5 });
    }

    #[test]
    fn test_failed_refresh_emits_nothing() {
        let (mut explore, sink) = explore();
        explore.histogram_chart("A", None).unwrap();
        explore.histograms.insert("gone".to_string(), 10);
        sink.take();

        let mask = BooleanChunked::from_slice("m".into(), &[false; 10]);
        assert_eq!(
            explore.refresh_all(Some(mask)).unwrap_err().error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert!(sink.take().is_empty());
        assert_eq!(count_selected(explore.selection()), 10);
    }

    #[test]
    fn test_drag_slider_refreshes_charts() {
        let (mut explore, sink) = explore();
        explore.histogram_chart("A", Some(10));
        explore.drag_slider("A", 2.0, 5.5).unwrap();

        assert_eq!(explore.selection_box().get_bounds("A"), (Some(2.0), Some(5.5)));
        assert_eq!(count_selected(explore.selection()), 4);
        assert_eq!(explore.status(), StatusSummary { selected: 4, total: 10 });

        let selected = histogram_selected(sink.last_for("histogram:A"));
        assert_eq!(selected.iter().sum::<usize>(), 4);
    }

    #[test]
    fn test_drag_to_edges_opens_bounds() {
        let (mut explore, _) = explore();
        explore.drag_slider("A", 0.01, 10.0).unwrap();
        assert!(explore.selection_box().get("A").is_none());
        assert_eq!(count_selected(explore.selection()), 10);
    }

    #[test]
    fn test_toggle_updates_frequencies() {
        let (mut explore, sink) = explore();
        explore.frequency_chart("C");
        explore
            .toggle("C", BTreeSet::from([Category::from("x")]))
            .unwrap();
        match sink.last_for("frequencies:C") {
            Some(RedrawUpdate::Frequencies { counts, .. }) => {
                assert_eq!(counts.selected, vec![4, 0, 0]);
                assert_eq!(counts.outside(), vec![0, 3, 3]);
            }
            other => panic!("expected frequencies, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_selector_kind() {
        let (mut explore, _) = explore();
        let err = explore.toggle("A", BTreeSet::new()).unwrap_err();
        assert_eq!(err.error_code(), "WRONG_SELECTOR");
        let err = explore.drag_slider("C", 0.0, 1.0).unwrap_err();
        assert_eq!(err.error_code(), "WRONG_SELECTOR");
    }

    #[test]
    fn test_selector_construction_by_type() {
        let (mut explore, _) = explore();
        match explore.selector("N").unwrap() {
            Selector::Range(r) => {
                assert!(r.integer);
                assert_eq!((r.min, r.max, r.step), (1.0, 4.0, 1.0));
            }
            other => panic!("expected range, got {other:?}"),
        }
        match explore.selector("A").unwrap() {
            Selector::Range(r) => {
                assert!(!r.integer);
                assert_eq!(r.step, 10.0 / 200.0);
            }
            other => panic!("expected range, got {other:?}"),
        }
        // measures take their domain from the data
        match explore.selector("M").unwrap() {
            Selector::Range(r) => assert_eq!((r.min, r.max), (10.0, 19.0)),
            other => panic!("expected range, got {other:?}"),
        }
        assert!(matches!(explore.selector("F").unwrap(), Selector::Toggle(_)));
    }

    #[test]
    fn test_selector_domain_override() {
        let (mut explore, _) = explore();
        match explore.selector_with_domain("A", Some(-5.0), None).unwrap() {
            Selector::Range(r) => assert_eq!((r.min, r.max), (-5.0, 10.0)),
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn test_panels_skip_unknown_columns() {
        let (mut explore, _) = explore();
        let panels = explore.selectors(&["A", "nope", "C"], ChartStyle::Hist);
        let labels: Vec<&str> = panels.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "C"]);
        assert!(panels.iter().all(|p| p.selector.is_some()));
    }

    #[test]
    fn test_viewers_default_to_measures() {
        let (mut explore, _) = explore();
        let empty: [&str; 0] = [];
        let panels = explore.viewers(&empty, ChartStyle::Kde);
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].label, "M");
        assert!(panels[0].selector.is_none());
        assert!(matches!(panels[0].chart, RedrawUpdate::Kde { .. }));
    }

    #[test]
    fn test_complete_dashboard() {
        let (mut explore, _) = explore();
        let dashboard = explore.complete(ChartStyle::Kde);
        assert_eq!(dashboard.status.total, 10);
        assert_eq!(dashboard.levers.len(), 2);
        assert_eq!(dashboard.uncertainties.len(), 2);
        assert_eq!(dashboard.measures.len(), 1);
    }

    #[test]
    fn test_two_way_is_cached_until_reset() {
        let (mut explore, sink) = explore();
        explore.two_way("main", false).unwrap().set_x("A").unwrap();
        assert_eq!(explore.two_way("main", false).unwrap().x_column(), Some("A"));
        explore.two_way("main", false).unwrap().set_x("M").unwrap();
        assert_eq!(explore.two_way("main", false).unwrap().x_column(), Some("M"));
        assert_eq!(explore.two_way("main", true).unwrap().x_column(), Some("A"));
        assert!(sink.last_for("scatter:main").is_some());
        assert_eq!(explore.two_way_keys(), vec!["main"]);
    }

    #[test]
    fn test_refresh_reaches_two_way_views() {
        let (mut explore, _) = explore();
        explore
            .two_way("main", false)
            .unwrap()
            .set_selection_source(crate::scatter::SelectionSource::Box)
            .unwrap();
        explore.drag_slider("A", 5.0, 10.0).unwrap();
        let view = explore.two_way("main", false).unwrap();
        assert_eq!(count_selected(view.selection().unwrap()), 5);
    }

    #[test]
    fn test_refresh_with_explicit_mask() {
        let (mut explore, _) = explore();
        let mask = BooleanChunked::from_slice("m".into(), &[true; 10]);
        explore.refresh_all(Some(mask)).unwrap();
        let bad = BooleanChunked::from_slice("m".into(), &[true; 3]);
        assert_eq!(
            explore.refresh_all(Some(bad)).unwrap_err().error_code(),
            "MASK_LENGTH_MISMATCH"
        );
    }

    #[test]
    fn test_set_box_replaces_selection() {
        let (mut explore, _) = explore();
        explore.selector("A").unwrap();
        let mut b = SelectionBox::new("other");
        b.set_bounds("M", Some(15.0), None);
        explore.set_box(b).unwrap();
        assert_eq!(
            mask_to_vec(explore.selection()),
            vec![false, false, false, false, false, true, true, true, true, true]
        );
        assert_eq!(explore.selection_box().name, "other");
    }
}
