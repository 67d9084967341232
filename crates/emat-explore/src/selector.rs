//! Threshold selectors backing a selection box.
//!
//! A [`Selector`] is the control model behind one column: a range slider
//! for integer and continuous variables, or a set of toggle buttons for
//! boolean and categorical ones.

use crate::selection_box::SelectionBox;
use crate::types::Category;
use serde::Serialize;
use std::collections::BTreeSet;

/// Fraction of the slider span within which a handle dragged towards the
/// domain edge is treated as unbounded on that side.
///
/// Fixed for every variable.
pub const SNAP_TOLERANCE: f64 = 0.0051;

/// Range slider over `[min, max]` for a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSelector {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub integer: bool,
    /// Current handle positions.
    pub value: (f64, f64),
    pub readout_format: &'static str,
}

impl RangeSelector {
    /// Slider with handles placed at the box's current bounds, or at the
    /// domain edges for open sides.
    pub fn new(
        column: impl Into<String>,
        min: f64,
        max: f64,
        integer: bool,
        steps: usize,
        current: (Option<f64>, Option<f64>),
    ) -> Self {
        let step = if integer {
            1.0
        } else {
            (max - min) / steps.max(1) as f64
        };
        Self {
            column: column.into(),
            min,
            max,
            step,
            integer,
            value: (current.0.unwrap_or(min), current.1.unwrap_or(max)),
            readout_format: if integer { "d" } else { ".3g" },
        }
    }

    /// Lower handle positions at or below this are unbounded.
    pub fn close_to_min(&self) -> f64 {
        self.min + SNAP_TOLERANCE * (self.max - self.min)
    }

    /// Upper handle positions at or above this are unbounded.
    pub fn close_to_max(&self) -> f64 {
        self.max - SNAP_TOLERANCE * (self.max - self.min)
    }

    /// Convert handle positions into box bounds, opening near-edge sides.
    pub fn snap(&self, low: f64, high: f64) -> (Option<f64>, Option<f64>) {
        let low = (low > self.close_to_min()).then_some(low);
        let high = (high < self.close_to_max()).then_some(high);
        (low, high)
    }

    /// Move the handles and write the snapped bounds into `target`.
    pub fn drag(&mut self, low: f64, high: f64, target: &mut SelectionBox) {
        self.value = (low, high);
        let (low, high) = self.snap(low, high);
        target.set_bounds(self.column.clone(), low, high);
    }
}

/// Multi-toggle over the labels of a categorical or boolean column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleSelector {
    pub column: String,
    pub options: Vec<Category>,
    pub value: BTreeSet<Category>,
}

impl ToggleSelector {
    pub fn new(column: impl Into<String>, options: Vec<Category>, current: BTreeSet<Category>) -> Self {
        Self {
            column: column.into(),
            options,
            value: current,
        }
    }

    /// Replace the toggled set and write it into `target`.
    pub fn toggle(&mut self, allowed: BTreeSet<Category>, target: &mut SelectionBox) {
        self.value = allowed.clone();
        target.replace_allowed_set(self.column.clone(), allowed);
    }
}

/// Control model for one box threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    Range(RangeSelector),
    Toggle(ToggleSelector),
}

impl Selector {
    pub fn column(&self) -> &str {
        match self {
            Selector::Range(r) => &r.column,
            Selector::Toggle(t) => &t.column,
        }
    }
}
