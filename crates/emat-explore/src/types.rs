use polars::prelude::BooleanChunked;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean row mask aligned by position with a dataset; `true` = inside.
pub type Mask = BooleanChunked;

/// A categorical value as it can appear in an allowed set or a label list.
///
/// Boolean columns use [`Category::Bool`], integer-coded columns
/// [`Category::Int`], and everything else is compared through its string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Bool(b) => write!(f, "{b}"),
            Category::Int(i) => write!(f, "{i}"),
            Category::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Category {
    fn from(value: bool) -> Self {
        Category::Bool(value)
    }
}

impl From<i64> for Category {
    fn from(value: i64) -> Self {
        Category::Int(value)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::Text(value.to_string())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::Text(value)
    }
}

/// Count of rows inside the current selection versus all rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub selected: usize,
    pub total: usize,
}

impl StatusSummary {
    pub fn outside(&self) -> usize {
        self.total - self.selected
    }

    /// Status line in the form shown above the selector panels.
    pub fn message(&self) -> String {
        format!(
            "{} Cases Selected out of {} Total Cases",
            group_thousands(self.selected),
            group_thousands(self.total)
        )
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Per-bin counts of a numeric column against cached, fixed bin edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramCounts {
    pub unconditional: Vec<usize>,
    pub selected: Vec<usize>,
    pub left_edges: Vec<f64>,
    pub widths: Vec<f64>,
}

impl HistogramCounts {
    /// Rows outside the selection, per bin.
    pub fn outside(&self) -> Vec<usize> {
        outside_counts(&self.unconditional, &self.selected)
    }
}

/// Per-label counts of a categorical or boolean column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyCounts {
    pub labels: Vec<Category>,
    pub unconditional: Vec<usize>,
    pub selected: Vec<usize>,
}

impl FrequencyCounts {
    /// Rows outside the selection, per label.
    pub fn outside(&self) -> Vec<usize> {
        outside_counts(&self.unconditional, &self.selected)
    }
}

/// Unconditional and selected density curves on a shared grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdeCurves {
    pub x: Vec<f64>,
    pub unconditional: Vec<f64>,
    pub selected: Vec<f64>,
    pub bandwidth_factor: f64,
}

fn outside_counts(unconditional: &[usize], selected: &[usize]) -> Vec<usize> {
    unconditional
        .iter()
        .zip(selected)
        .map(|(all, sel)| all.saturating_sub(*sel))
        .collect()
}
