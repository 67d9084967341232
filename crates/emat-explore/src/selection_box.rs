//! Selection boxes: named conjunctions of per-column constraints.

use crate::error::Result;
use crate::types::{Category, Mask};
use crate::utils::{aligned_values, category_values, column_series};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Constraint on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Inclusive numeric bounds; `None` leaves that side open.
    Bounds {
        low: Option<f64>,
        high: Option<f64>,
    },
    /// Values allowed for a categorical or boolean column.
    Allowed(BTreeSet<Category>),
}

impl Threshold {
    pub fn bounds(&self) -> Option<(Option<f64>, Option<f64>)> {
        match self {
            Threshold::Bounds { low, high } => Some((*low, *high)),
            Threshold::Allowed(_) => None,
        }
    }

    fn admits_number(low: Option<f64>, high: Option<f64>, v: f64) -> bool {
        low.is_none_or(|lo| v >= lo) && high.is_none_or(|hi| v <= hi)
    }
}

/// A named set of thresholds; rows inside satisfy every threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionBox {
    pub name: String,
    #[serde(default)]
    thresholds: BTreeMap<String, Threshold>,
}

impl SelectionBox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            thresholds: BTreeMap::new(),
        }
    }

    /// Load a box from its JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn thresholds(&self) -> &BTreeMap<String, Threshold> {
        &self.thresholds
    }

    pub fn get(&self, column: &str) -> Option<&Threshold> {
        self.thresholds.get(column)
    }

    /// Current bounds of a column, `(None, None)` when unconstrained.
    pub fn get_bounds(&self, column: &str) -> (Option<f64>, Option<f64>) {
        self.get(column)
            .and_then(Threshold::bounds)
            .unwrap_or((None, None))
    }

    /// Current allowed set of a column, empty when unconstrained.
    pub fn get_allowed(&self, column: &str) -> BTreeSet<Category> {
        match self.get(column) {
            Some(Threshold::Allowed(set)) => set.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// Set both bounds; two open sides remove the constraint.
    pub fn set_bounds(&mut self, column: impl Into<String>, low: Option<f64>, high: Option<f64>) {
        let column = column.into();
        if low.is_none() && high.is_none() {
            self.thresholds.remove(&column);
        } else {
            self.thresholds
                .insert(column, Threshold::Bounds { low, high });
        }
    }

    pub fn set_lower(&mut self, column: impl Into<String>, low: Option<f64>) {
        let column = column.into();
        let (_, high) = self.get_bounds(&column);
        self.set_bounds(column, low, high);
    }

    pub fn set_upper(&mut self, column: impl Into<String>, high: Option<f64>) {
        let column = column.into();
        let (low, _) = self.get_bounds(&column);
        self.set_bounds(column, low, high);
    }

    pub fn replace_allowed_set(
        &mut self,
        column: impl Into<String>,
        allowed: impl IntoIterator<Item = Category>,
    ) {
        self.thresholds
            .insert(column.into(), Threshold::Allowed(allowed.into_iter().collect()));
    }

    pub fn clear(&mut self, column: &str) -> Option<Threshold> {
        self.thresholds.remove(column)
    }

    /// Rows of `data` satisfying every threshold.
    ///
    /// Nulls never satisfy a constraint. A threshold on a column absent from
    /// `data` imposes no restriction.
    pub fn inside(&self, data: &DataFrame) -> Result<Mask> {
        let mut keep = vec![true; data.height()];
        for (column, threshold) in &self.thresholds {
            let series = match column_series(data, column) {
                Ok(series) => series,
                Err(_) => {
                    warn!("box '{}' constrains '{}', which is not in the data", self.name, column);
                    continue;
                }
            };
            match threshold {
                Threshold::Bounds { low, high } => {
                    for (k, v) in keep.iter_mut().zip(aligned_values(series)?) {
                        *k &= v.is_some_and(|v| Threshold::admits_number(*low, *high, v));
                    }
                }
                Threshold::Allowed(allowed) => {
                    for (k, v) in keep.iter_mut().zip(category_values(series)?) {
                        *k &= v.is_some_and(|v| allowed.contains(&v));
                    }
                }
            }
        }
        Ok(BooleanChunked::from_slice(self.name.as_str().into(), &keep))
    }
}
