//! Selection chart cache.
//!
//! For each column and chart kind the unconditional summary (bin edges and
//! counts, label codes and counts, KDE grid and curve) is computed once, on
//! first request, and kept for the life of the cache. Later requests only
//! recompute the part conditional on the current selection mask, against
//! the cached bins.

use crate::error::Result;
use crate::stats::{
    Bandwidth, GaussianKde, code_counts, histogram_counts, histogram_edges, linspace, min_max,
};
use crate::types::{Category, FrequencyCounts, HistogramCounts, KdeCurves, Mask};
use crate::utils::{
    aligned_values, category_values, check_mask, column_series, finite_values, mask_to_vec,
    select_rows,
};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Number of grid points a KDE curve is evaluated on.
pub const DEFAULT_KDE_POINTS: usize = 250;

#[derive(Debug, Clone)]
struct CachedHistogram {
    edges: Vec<f64>,
    counts: Vec<usize>,
}

#[derive(Debug, Clone)]
struct CachedFrequencies {
    labels: Vec<Category>,
    codes: Vec<Option<usize>>,
    counts: Vec<usize>,
}

#[derive(Debug, Clone)]
struct CachedKde {
    factor: f64,
    grid: Vec<f64>,
    curve: Vec<f64>,
}

/// Per-view cache of unconditional chart data over one dataset.
#[derive(Debug, Clone)]
pub struct SelectionChartCache {
    data: DataFrame,
    kde_points: usize,
    histograms: HashMap<String, CachedHistogram>,
    frequencies: HashMap<String, CachedFrequencies>,
    kdes: HashMap<String, CachedKde>,
}

impl SelectionChartCache {
    pub fn new(data: DataFrame) -> Self {
        Self::with_kde_points(data, DEFAULT_KDE_POINTS)
    }

    pub fn with_kde_points(data: DataFrame, kde_points: usize) -> Self {
        Self {
            data,
            kde_points: kde_points.max(2),
            histograms: HashMap::new(),
            frequencies: HashMap::new(),
            kdes: HashMap::new(),
        }
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn rows(&self) -> usize {
        self.data.height()
    }

    /// Whether an unconditional histogram is cached for `column`.
    pub fn has_histogram(&self, column: &str) -> bool {
        self.histograms.contains_key(column)
    }

    /// Histogram of `column`, split by `mask`.
    ///
    /// `bins` is only used the first time a column is requested; later calls
    /// count against the cached edges. A `None` mask selects every row.
    pub fn histogram(
        &mut self,
        column: &str,
        bins: usize,
        mask: Option<&Mask>,
    ) -> Result<HistogramCounts> {
        let keep = self.keep_rows(mask)?;
        if !self.histograms.contains_key(column) {
            let values = finite_values(column_series(&self.data, column)?)?;
            let edges = histogram_edges(&values, bins);
            let counts = histogram_counts(&values, &edges);
            debug!("cached {} histogram bins for '{}'", counts.len(), column);
            self.histograms
                .insert(column.to_string(), CachedHistogram { edges, counts });
        }
        let cached = &self.histograms[column];

        let selected = match keep {
            None => cached.counts.clone(),
            Some(keep) => {
                let values = aligned_values(column_series(&self.data, column)?)?;
                let picked: Vec<f64> = select_rows(&values, &keep)
                    .into_iter()
                    .flatten()
                    .filter(|v| v.is_finite())
                    .collect();
                histogram_counts(&picked, &cached.edges)
            }
        };

        let left_edges = cached.edges[..cached.edges.len() - 1].to_vec();
        let widths = cached.edges.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(HistogramCounts {
            unconditional: cached.counts.clone(),
            selected,
            left_edges,
            widths,
        })
    }

    /// Frequency of each label of `column`, split by `mask`.
    ///
    /// The label ordering given on the first call is fixed for the life of
    /// the cache; `labels` is ignored afterwards. Values outside the label
    /// list are not counted.
    pub fn frequencies(
        &mut self,
        column: &str,
        labels: &[Category],
        mask: Option<&Mask>,
    ) -> Result<FrequencyCounts> {
        let keep = self.keep_rows(mask)?;
        if !self.frequencies.contains_key(column) {
            let values = category_values(column_series(&self.data, column)?)?;
            let codes: Vec<Option<usize>> = values
                .iter()
                .map(|v| v.as_ref().and_then(|v| labels.iter().position(|l| l == v)))
                .collect();
            let counts = code_counts(codes.iter().copied(), labels.len());
            debug!("cached {} frequency codes for '{}'", labels.len(), column);
            self.frequencies.insert(
                column.to_string(),
                CachedFrequencies {
                    labels: labels.to_vec(),
                    codes,
                    counts,
                },
            );
        }
        let cached = &self.frequencies[column];

        let selected = match keep {
            None => cached.counts.clone(),
            Some(keep) => code_counts(
                cached
                    .codes
                    .iter()
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .map(|(c, _)| *c),
                cached.labels.len(),
            ),
        };

        Ok(FrequencyCounts {
            labels: cached.labels.clone(),
            unconditional: cached.counts.clone(),
            selected,
        })
    }

    /// Kernel density of `column` and of its selected rows on a shared grid.
    ///
    /// The first call fixes the bandwidth factor (from `bandwidth`) and the
    /// grid over the column's range. The selected curve is always fit with
    /// the cached factor. Too few distinct selected values give a zero curve.
    pub fn kde(
        &mut self,
        column: &str,
        mask: Option<&Mask>,
        bandwidth: Bandwidth,
    ) -> Result<KdeCurves> {
        let keep = self.keep_rows(mask)?;
        if !self.kdes.contains_key(column) {
            let values = finite_values(column_series(&self.data, column)?)?;
            let (lo, hi) = min_max(&values).unwrap_or((0.0, 1.0));
            let grid = linspace(lo, hi, self.kde_points);
            let (factor, curve) = match GaussianKde::fit(values.clone(), bandwidth) {
                Some(kde) => (kde.factor(), kde.evaluate_grid(&grid)),
                None => (bandwidth.factor(values.len()), vec![0.0; grid.len()]),
            };
            debug!("cached kde for '{}' with factor {:.4}", column, factor);
            self.kdes
                .insert(column.to_string(), CachedKde { factor, grid, curve });
        }
        let cached = &self.kdes[column];

        let selected = match keep {
            None => cached.curve.clone(),
            Some(keep) => {
                let values = aligned_values(column_series(&self.data, column)?)?;
                let picked: Vec<f64> = select_rows(&values, &keep)
                    .into_iter()
                    .flatten()
                    .filter(|v| v.is_finite())
                    .collect();
                match GaussianKde::fit(picked, Bandwidth::Factor(cached.factor)) {
                    Some(kde) => kde.evaluate_grid(&cached.grid),
                    None => {
                        debug!("selection too small for a kde on '{}'", column);
                        vec![0.0; cached.grid.len()]
                    }
                }
            }
        };

        Ok(KdeCurves {
            x: cached.grid.clone(),
            unconditional: cached.curve.clone(),
            selected,
            bandwidth_factor: cached.factor,
        })
    }

    fn keep_rows(&self, mask: Option<&Mask>) -> Result<Option<Vec<bool>>> {
        match mask {
            None => Ok(None),
            Some(mask) => {
                check_mask(mask, self.rows())?;
                Ok(Some(mask_to_vec(mask)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection_box::SelectionBox;

    fn ramp_df() -> DataFrame {
        let a: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
        let c: Vec<&str> = (0..100)
            .map(|i| ["low", "mid", "high"][i % 3])
            .collect();
        df! { "A" => a, "C" => c }.unwrap()
    }

    fn mask_for(df: &DataFrame, low: f64, high: f64) -> Mask {
        let mut b = SelectionBox::new("t");
        b.set_bounds("A", Some(low), Some(high));
        b.inside(df).unwrap()
    }

    #[test]
    fn test_histogram_outside_plus_selected_is_total() {
        let df = ramp_df();
        let mut cache = SelectionChartCache::new(df.clone());
        let mask = mask_for(&df, 2.0, 6.5);
        let h = cache.histogram("A", 10, Some(&mask)).unwrap();
        let outside = h.outside();
        for i in 0..10 {
            assert_eq!(outside[i] + h.selected[i], h.unconditional[i]);
        }
        assert_eq!(h.unconditional.iter().sum::<usize>(), 100);
    }

    #[test]
    fn test_histogram_edges_are_not_recomputed() {
        let df = ramp_df();
        let mut cache = SelectionChartCache::new(df.clone());
        let first = cache.histogram("A", 10, None).unwrap();
        let mask = mask_for(&df, 0.0, 1.0);
        let second = cache.histogram("A", 4, Some(&mask)).unwrap();
        assert_eq!(first.left_edges, second.left_edges);
        assert_eq!(first.unconditional, second.unconditional);
        assert_eq!(second.selected.iter().sum::<usize>(), 11);
    }

    #[test]
    fn test_histogram_without_mask_selects_all() {
        let mut cache = SelectionChartCache::new(ramp_df());
        let h = cache.histogram("A", 5, None).unwrap();
        assert_eq!(h.selected, h.unconditional);
        assert!(h.widths.iter().all(|w| (w - 9.9 / 5.0).abs() < 1e-9));
    }

    #[test]
    fn test_mask_length_mismatch_is_an_error() {
        let mut cache = SelectionChartCache::new(ramp_df());
        let short = BooleanChunked::full("m".into(), true, 5);
        let err = cache.histogram("A", 10, Some(&short)).unwrap_err();
        assert_eq!(err.error_code(), "MASK_LENGTH_MISMATCH");
    }

    #[test]
    fn test_unknown_column() {
        let mut cache = SelectionChartCache::new(ramp_df());
        let err = cache.histogram("nope", 10, None).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
        assert!(!cache.has_histogram("nope"));
    }

    #[test]
    fn test_frequencies_fix_label_order() {
        let df = ramp_df();
        let mut cache = SelectionChartCache::new(df.clone());
        let labels: Vec<Category> = vec!["high".into(), "mid".into(), "low".into()];
        let f = cache.frequencies("C", &labels, None).unwrap();
        assert_eq!(f.unconditional, vec![33, 33, 34]);

        let reordered: Vec<Category> = vec!["low".into(), "mid".into(), "high".into()];
        let mask = mask_for(&df, 0.0, 0.5);
        let g = cache.frequencies("C", &reordered, Some(&mask)).unwrap();
        assert_eq!(g.labels, labels);
        assert_eq!(g.selected, vec![2, 2, 2]);
        let outside = g.outside();
        for i in 0..3 {
            assert_eq!(outside[i] + g.selected[i], g.unconditional[i]);
        }
    }

    #[test]
    fn test_frequencies_skip_unlisted_values() {
        let mut cache = SelectionChartCache::new(ramp_df());
        let f = cache.frequencies("C", &["low".into()], None).unwrap();
        assert_eq!(f.unconditional, vec![34]);
    }

    #[test]
    fn test_kde_shares_grid_and_factor_across_masks() {
        let df = ramp_df();
        let mut cache = SelectionChartCache::new(df.clone());
        let m1 = mask_for(&df, 0.0, 3.0);
        let m2 = mask_for(&df, 5.0, 9.9);
        let k1 = cache.kde("A", Some(&m1), Bandwidth::Scott).unwrap();
        let k2 = cache.kde("A", Some(&m2), Bandwidth::Silverman).unwrap();
        assert_eq!(k1.x, k2.x);
        assert_eq!(k1.bandwidth_factor, k2.bandwidth_factor);
        assert_eq!(k1.unconditional, k2.unconditional);
        assert_ne!(k1.selected, k2.selected);
        assert_eq!(k1.x.len(), 250);
        assert_eq!(k1.x[0], 0.0);
        assert_eq!(k1.x[249], 9.9);
        assert!((k1.bandwidth_factor - 100f64.powf(-0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_kde_empty_selection_is_zero() {
        let df = ramp_df();
        let mut cache = SelectionChartCache::new(df.clone());
        let mask = mask_for(&df, 50.0, 60.0);
        let k = cache.kde("A", Some(&mask), Bandwidth::Scott).unwrap();
        assert!(k.selected.iter().all(|v| *v == 0.0));
        assert!(k.unconditional.iter().any(|v| *v > 0.0));
    }
}
