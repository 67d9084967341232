//! Numeric routines behind the chart cache: binning and kernel density.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Smallest and largest value of a slice, or `None` when empty.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Sample variance (`ddof = 1`); zero for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// `count` evenly spaced points from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

// =============================================================================
// Histograms
// =============================================================================

/// `bins + 1` equal-width edges spanning the data.
///
/// A constant column is widened to `[v - 0.5, v + 0.5]`, and an empty one is
/// binned over `[0, 1]`.
pub fn histogram_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let bins = bins.max(1);
    let (lo, hi) = match min_max(values) {
        Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
        Some(range) => range,
        None => (0.0, 1.0),
    };
    linspace(lo, hi, bins + 1)
}

/// Count values per bin. Every bin is half-open except the last, which
/// includes its right edge; values outside the edges are not counted.
pub fn histogram_counts(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let bins = edges.len().saturating_sub(1);
    let mut counts = vec![0usize; bins];
    if bins == 0 {
        return counts;
    }
    let (first, last) = (edges[0], edges[bins]);
    for &v in values {
        if !(first..=last).contains(&v) {
            continue;
        }
        // first edge strictly greater than v, minus one
        let idx = edges.partition_point(|e| *e <= v).saturating_sub(1);
        counts[idx.min(bins - 1)] += 1;
    }
    counts
}

/// Count integer codes in `0..n_labels`; `None` codes are skipped.
pub fn code_counts(codes: impl IntoIterator<Item = Option<usize>>, n_labels: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_labels];
    for code in codes.into_iter().flatten() {
        if code < n_labels {
            counts[code] += 1;
        }
    }
    counts
}

// =============================================================================
// Kernel Density
// =============================================================================

/// How the KDE bandwidth factor is chosen for the unconditional curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bandwidth {
    /// Scott's rule, `n^(-1/5)`.
    #[default]
    Scott,
    /// Silverman's rule, `(3n/4)^(-1/5)`.
    Silverman,
    /// A fixed factor.
    Factor(f64),
}

impl Bandwidth {
    pub fn factor(&self, n: usize) -> f64 {
        let n = n.max(1) as f64;
        match self {
            Bandwidth::Scott => n.powf(-0.2),
            Bandwidth::Silverman => (n * 3.0 / 4.0).powf(-0.2),
            Bandwidth::Factor(f) => *f,
        }
    }
}

/// Gaussian kernel density estimate over one variable.
///
/// The kernel variance is the sample variance of the data scaled by
/// `factor^2`, so two estimates built with the same factor apply the same
/// relative smoothing to their own data.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    points: Vec<f64>,
    factor: f64,
    kernel_std: f64,
}

impl GaussianKde {
    /// Fit an estimate, or `None` when the data cannot define a kernel
    /// (fewer than two points or zero variance).
    pub fn fit(points: Vec<f64>, bandwidth: Bandwidth) -> Option<Self> {
        let factor = bandwidth.factor(points.len());
        let variance = sample_variance(&points);
        if points.len() < 2 || variance <= 0.0 || !variance.is_finite() || factor <= 0.0 {
            return None;
        }
        Some(Self {
            kernel_std: variance.sqrt() * factor,
            points,
            factor,
        })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let norm = 1.0 / (self.kernel_std * (2.0 * PI).sqrt() * self.points.len() as f64);
        self.points
            .iter()
            .map(|p| {
                let z = (x - p) / self.kernel_std;
                (-0.5 * z * z).exp()
            })
            .sum::<f64>()
            * norm
    }

    pub fn evaluate_grid(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|x| self.evaluate(*x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== basic statistics tests ====================

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[3.0, -1.0, 7.5]), Some((-1.0, 7.5)));
        assert_eq!(min_max(&[]), None);
    }

    #[test]
    fn test_sample_variance() {
        // mean 3, squared deviations sum to 10, ddof 1 -> 2.5
        assert!((sample_variance(&[1.0, 2.0, 3.0, 4.0, 5.0]) - 2.5).abs() < 1e-12);
        assert_eq!(sample_variance(&[5.0]), 0.0);
    }

    #[test]
    fn test_linspace_endpoints() {
        let grid = linspace(0.0, 10.0, 250);
        assert_eq!(grid.len(), 250);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[249], 10.0);
    }

    // ==================== histogram tests ====================

    #[test]
    fn test_histogram_edges_equal_width() {
        let edges = histogram_edges(&[0.0, 10.0, 5.0], 10);
        assert_eq!(edges.len(), 11);
        for pair in edges.windows(2) {
            assert!((pair[1] - pair[0] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_histogram_edges_constant_column() {
        let edges = histogram_edges(&[4.0, 4.0], 2);
        assert_eq!(edges, vec![3.5, 4.0, 4.5]);
    }

    #[test]
    fn test_histogram_counts_last_bin_closed() {
        let edges = vec![0.0, 1.0, 2.0];
        let counts = histogram_counts(&[0.0, 0.5, 1.0, 2.0, 2.5, -0.1], &edges);
        assert_eq!(counts, vec![2, 2]);
    }

    #[test]
    fn test_code_counts_skips_unknown() {
        let counts = code_counts(vec![Some(0), Some(2), None, Some(2), Some(9)], 3);
        assert_eq!(counts, vec![1, 0, 2]);
    }

    // ==================== kde tests ====================

    #[test]
    fn test_scott_factor() {
        let f = Bandwidth::Scott.factor(32);
        assert!((f - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let points: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
        let kde = GaussianKde::fit(points, Bandwidth::Scott).unwrap();
        let grid = linspace(-5.0, 10.0, 3001);
        let dx = grid[1] - grid[0];
        let area: f64 = kde.evaluate_grid(&grid).iter().sum::<f64>() * dx;
        assert!((area - 1.0).abs() < 1e-3, "area = {area}");
    }

    #[test]
    fn test_kde_degenerate_data() {
        assert!(GaussianKde::fit(vec![1.0], Bandwidth::Scott).is_none());
        assert!(GaussianKde::fit(vec![2.0, 2.0, 2.0], Bandwidth::Scott).is_none());
    }

    #[test]
    fn test_kde_keeps_fixed_factor() {
        let kde = GaussianKde::fit(vec![0.0, 1.0, 3.0], Bandwidth::Factor(0.3)).unwrap();
        assert_eq!(kde.factor(), 0.3);
    }
}
