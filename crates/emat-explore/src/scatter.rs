//! Two-way scatter view with marginal histograms and a selection overlay.
//!
//! The view splits its points into an outside and an inside group by the
//! current selection, scales marker opacity down for dense groups, and
//! overlays the box's bounds as a rectangle when both axes are constrained.
//! Every change is pushed to the sink as a [`ScatterFrame`].

use crate::config::ScatterConfig;
use crate::error::{ExploreError, Result};
use crate::expression::evaluate_expression;
use crate::scope::Scope;
use crate::selection_box::{SelectionBox, Threshold};
use crate::sink::{RedrawSink, RedrawUpdate};
use crate::stats::min_max;
use crate::types::Mask;
use crate::utils::{aligned_values, check_mask, column_series, mask_to_vec};
use polars::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where the view's selection comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionSource {
    /// No selection; all points form one group.
    #[default]
    None,
    /// Rows inside the attached box, tracking box changes.
    Box,
    /// Rows matching a row expression.
    Expression(String),
}

/// Data bound to one axis.
#[derive(Debug, Clone)]
pub enum AxisSource {
    /// A column of the view's dataset.
    Column(String),
    /// Precomputed values, one per row.
    Values {
        label: Option<String>,
        values: Vec<f64>,
    },
}

impl From<&str> for AxisSource {
    fn from(name: &str) -> Self {
        AxisSource::Column(name.to_string())
    }
}

#[derive(Debug, Clone)]
struct Axis {
    column: Option<String>,
    title: String,
    values: Vec<Option<f64>>,
    range: (f64, f64),
}

impl Axis {
    fn width(&self) -> f64 {
        let w = self.range.1 - self.range.0;
        if w > 0.0 { w } else { 1.0 }
    }
}

/// A group of plotted points.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointGroup {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub opacity: f64,
}

/// Translucent constraint rectangle in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// Everything a renderer needs to draw the view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterFrame {
    pub x_title: String,
    pub y_title: String,
    pub outside: PointGroup,
    pub inside: PointGroup,
    /// Marginal histogram samples: all rows, then selected rows.
    pub x_margin: (Vec<f64>, Vec<f64>),
    pub y_margin: (Vec<f64>, Vec<f64>),
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub rectangle: Option<Rect>,
}

/// Opacity for a group of `count` points.
pub fn marker_opacity(count: usize, target: usize, floor: f64) -> f64 {
    if count == 0 {
        return 1.0;
    }
    (target as f64 / count as f64).min(1.0).max(floor)
}

/// Scatter view over two columns of a dataset.
pub struct ScatterSelectionView {
    name: Option<String>,
    data: DataFrame,
    scope: Option<Scope>,
    selection_box: Option<SelectionBox>,
    config: ScatterConfig,
    sink: Arc<dyn RedrawSink>,
    source: SelectionSource,
    expression: String,
    selection: Option<Mask>,
    x: Axis,
    y: Axis,
}

impl std::fmt::Debug for ScatterSelectionView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatterSelectionView")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("x", &self.x.title)
            .field("y", &self.y.title)
            .finish_non_exhaustive()
    }
}

impl ScatterSelectionView {
    /// View with the first column on x and the last on y, no selection.
    ///
    /// Nothing is drawn until the first change or an explicit [`redraw`](Self::redraw).
    pub fn new(
        data: DataFrame,
        selection_box: Option<SelectionBox>,
        scope: Option<Scope>,
        config: ScatterConfig,
        sink: Arc<dyn RedrawSink>,
    ) -> Result<Self> {
        let names: Vec<String> = data
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let (first, last) = match (names.first(), names.last()) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => return Err(ExploreError::NoValidValues("<empty dataset>".to_string())),
        };
        let x = Self::bind_axis(&data, scope.as_ref(), AxisSource::Column(first))?;
        let y = Self::bind_axis(&data, scope.as_ref(), AxisSource::Column(last))?;
        Ok(Self {
            name: None,
            data,
            scope,
            selection_box,
            config,
            sink,
            source: SelectionSource::None,
            expression: "True".to_string(),
            selection: None,
            x,
            y,
        })
    }

    /// Tag the frames this view emits.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn source(&self) -> &SelectionSource {
        &self.source
    }

    pub fn selection(&self) -> Option<&Mask> {
        self.selection.as_ref()
    }

    pub fn x_column(&self) -> Option<&str> {
        self.x.column.as_deref()
    }

    pub fn y_column(&self) -> Option<&str> {
        self.y.column.as_deref()
    }

    /// Bind the x axis and redraw.
    pub fn set_x(&mut self, source: impl Into<AxisSource>) -> Result<()> {
        self.x = Self::bind_axis(&self.data, self.scope.as_ref(), source.into())?;
        self.on_axis_changed();
        Ok(())
    }

    /// Bind the y axis and redraw.
    pub fn set_y(&mut self, source: impl Into<AxisSource>) -> Result<()> {
        self.y = Self::bind_axis(&self.data, self.scope.as_ref(), source.into())?;
        self.on_axis_changed();
        Ok(())
    }

    pub fn on_axis_changed(&self) {
        self.redraw();
    }

    /// Switch where the selection comes from.
    pub fn set_selection_source(&mut self, source: SelectionSource) -> Result<()> {
        match &source {
            SelectionSource::None => {
                self.source = source;
                self.change_selection(None)?;
            }
            SelectionSource::Box => {
                let mask = self
                    .selection_box
                    .as_ref()
                    .ok_or(ExploreError::NoBox)?
                    .inside(&self.data)?;
                self.source = source;
                self.change_selection(Some(mask))?;
            }
            SelectionSource::Expression(text) => {
                let text = text.clone();
                self.source = source;
                self.set_expression(&text);
            }
        }
        Ok(())
    }

    /// Apply a row expression as the selection.
    ///
    /// Returns `false` and keeps the previous selection when the expression
    /// does not parse or evaluate.
    pub fn set_expression(&mut self, text: &str) -> bool {
        self.expression = text.to_string();
        let mask = match evaluate_expression(text, &self.data) {
            Ok(mask) => mask,
            Err(e) => {
                warn!("keeping previous selection: {}", e);
                return false;
            }
        };
        match self.change_selection(Some(mask)) {
            Ok(()) => true,
            Err(e) => {
                warn!("keeping previous selection: {}", e);
                false
            }
        }
    }

    /// Replace the selection and redraw.
    pub fn change_selection(&mut self, selection: Option<Mask>) -> Result<()> {
        if let Some(mask) = &selection {
            check_mask(mask, self.data.height())?;
        }
        self.selection = selection;
        self.redraw();
        Ok(())
    }

    pub fn on_selection_changed(&mut self, selection: Option<Mask>) -> Result<()> {
        self.change_selection(selection)
    }

    /// Pick up a changed box. When the selection follows the box it is
    /// recomputed (or taken from `selection`, if the caller already has it);
    /// otherwise only the rectangle is redrawn.
    pub fn on_box_changed(
        &mut self,
        selection_box: &SelectionBox,
        selection: Option<&Mask>,
    ) -> Result<()> {
        self.selection_box = Some(selection_box.clone());
        if self.source == SelectionSource::Box {
            let mask = match selection {
                Some(mask) => mask.clone(),
                None => selection_box.inside(&self.data)?,
            };
            self.change_selection(Some(mask))
        } else {
            self.redraw();
            Ok(())
        }
    }

    /// Opacity of the outside and inside groups. Only rows with both
    /// coordinates present are counted.
    pub fn marker_opacities(&self) -> (f64, f64) {
        let target = self.config.target_marker_opacity;
        let floor = self.config.minimum_marker_opacity;
        let keep = self.selection.as_ref().map(mask_to_vec);
        let (mut outside, mut inside) = (0, 0);
        for (row, (x, y)) in self.x.values.iter().zip(&self.y.values).enumerate() {
            if x.is_none() || y.is_none() {
                continue;
            }
            if keep.as_ref().is_some_and(|k| k[row]) {
                inside += 1;
            } else {
                outside += 1;
            }
        }
        match keep {
            None => (marker_opacity(outside, target, floor), 1.0),
            Some(_) => (
                marker_opacity(outside, target, floor),
                marker_opacity(inside, target, floor),
            ),
        }
    }

    /// Box rectangle for the current axes, if both are bounded in the box.
    pub fn constraint_rect(&self) -> Option<Rect> {
        let b = self.selection_box.as_ref()?;
        let x_bounds = self.axis_bounds(b, &self.x)?;
        let y_bounds = self.axis_bounds(b, &self.y)?;
        let (x0, x1) = Self::close_bounds(x_bounds, &self.x);
        let (y0, y1) = Self::close_bounds(y_bounds, &self.y);
        Some(Rect { x0, x1, y0, y1 })
    }

    /// Compute the frame for the current state.
    pub fn frame(&self) -> ScatterFrame {
        let keep = self.selection.as_ref().map(mask_to_vec);
        let (out_opacity, in_opacity) = self.marker_opacities();
        let mut outside = PointGroup {
            opacity: out_opacity,
            ..Default::default()
        };
        let mut inside = PointGroup {
            opacity: in_opacity,
            ..Default::default()
        };
        let mut x_all = Vec::new();
        let mut y_all = Vec::new();
        let mut x_sel = Vec::new();
        let mut y_sel = Vec::new();

        for row in 0..self.data.height() {
            let selected = keep.as_ref().is_some_and(|k| k[row]);
            let (xv, yv) = (self.x.values[row], self.y.values[row]);
            if let Some(v) = xv {
                x_all.push(v);
                if selected {
                    x_sel.push(v);
                }
            }
            if let Some(v) = yv {
                y_all.push(v);
                if selected {
                    y_sel.push(v);
                }
            }
            if let (Some(xv), Some(yv)) = (xv, yv) {
                let group = if selected { &mut inside } else { &mut outside };
                group.x.push(xv);
                group.y.push(yv);
            }
        }

        let pad = self.config.range_padding;
        ScatterFrame {
            x_title: self.x.title.clone(),
            y_title: self.y.title.clone(),
            outside,
            inside,
            x_margin: (x_all, x_sel),
            y_margin: (y_all, y_sel),
            x_range: padded(&self.x, pad),
            y_range: padded(&self.y, pad),
            rectangle: self.constraint_rect(),
        }
    }

    /// Push the current frame to the sink.
    pub fn redraw(&self) {
        self.sink.redraw(RedrawUpdate::Scatter {
            view: self.name.clone(),
            frame: Box::new(self.frame()),
        });
    }

    fn axis_bounds(&self, b: &SelectionBox, axis: &Axis) -> Option<(Option<f64>, Option<f64>)> {
        match b.get(axis.column.as_deref()?)? {
            Threshold::Bounds { low, high } => Some((*low, *high)),
            Threshold::Allowed(_) => None,
        }
    }

    fn close_bounds(bounds: (Option<f64>, Option<f64>), axis: &Axis) -> (f64, f64) {
        (
            bounds.0.unwrap_or(axis.range.0 - axis.width()),
            bounds.1.unwrap_or(axis.range.1 + axis.width()),
        )
    }

    fn bind_axis(data: &DataFrame, scope: Option<&Scope>, source: AxisSource) -> Result<Axis> {
        let (column, title, values) = match source {
            AxisSource::Column(name) => {
                let values = aligned_values(column_series(data, &name)?)?;
                let title = scope.map_or(name.as_str(), |s| s.shortname(&name)).to_string();
                (Some(name), title, values)
            }
            AxisSource::Values { label, values } => {
                if values.len() != data.height() {
                    return Err(ExploreError::mask_length(data.height(), values.len()));
                }
                let title = match (&label, scope) {
                    (Some(l), Some(s)) => s.shortname(l).to_string(),
                    (Some(l), None) => l.clone(),
                    _ => String::new(),
                };
                (None, title, values.into_iter().map(Some).collect())
            }
        };
        let finite: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
        let range = min_max(&finite).unwrap_or((0.0, 1.0));
        debug!("bound axis '{}' over {:?}", title, range);
        Ok(Axis {
            column,
            title,
            values,
            range,
        })
    }
}

fn padded(axis: &Axis, pad: f64) -> (f64, f64) {
    let w = axis.width() * pad;
    (axis.range.0 - w, axis.range.1 + w)
}
