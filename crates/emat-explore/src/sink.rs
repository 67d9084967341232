//! Redraw sinks: where the views push chart updates.
//!
//! Views never read rendering state back; every change is announced as a
//! [`RedrawUpdate`] to the sink they were built with.
//!
//! # Example
//!
//! ```rust,ignore
//! use emat_explore::{ClosureRedrawSink, Explore};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(ClosureRedrawSink::new(|update| {
//!     println!("redraw: {}", update.target());
//! }));
//! let mut explore = Explore::new(scope, data, None, sink)?;
//! ```

use crate::scatter::ScatterFrame;
use crate::types::{FrequencyCounts, HistogramCounts, KdeCurves, StatusSummary};
use parking_lot::Mutex;
use serde::Serialize;

/// One redraw instruction for a host renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedrawUpdate {
    Status(StatusSummary),
    Histogram {
        column: String,
        counts: HistogramCounts,
    },
    Frequencies {
        column: String,
        counts: FrequencyCounts,
    },
    Kde {
        column: String,
        curves: KdeCurves,
    },
    Scatter {
        view: Option<String>,
        frame: Box<ScatterFrame>,
    },
}

impl RedrawUpdate {
    /// Short identifier of the chart this update targets.
    pub fn target(&self) -> String {
        match self {
            RedrawUpdate::Status(_) => "status".to_string(),
            RedrawUpdate::Histogram { column, .. } => format!("histogram:{column}"),
            RedrawUpdate::Frequencies { column, .. } => format!("frequencies:{column}"),
            RedrawUpdate::Kde { column, .. } => format!("kde:{column}"),
            RedrawUpdate::Scatter { view, .. } => {
                format!("scatter:{}", view.as_deref().unwrap_or("-"))
            }
        }
    }
}

/// Trait for receiving redraw instructions.
///
/// Implementations must be `Send + Sync` so a host can forward updates
/// to a UI thread.
pub trait RedrawSink: Send + Sync {
    fn redraw(&self, update: RedrawUpdate);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RedrawSink for NullSink {
    fn redraw(&self, _update: RedrawUpdate) {}
}

/// Wrapper that implements [`RedrawSink`] using a closure.
pub struct ClosureRedrawSink<F>
where
    F: Fn(RedrawUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureRedrawSink<F>
where
    F: Fn(RedrawUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> RedrawSink for ClosureRedrawSink<F>
where
    F: Fn(RedrawUpdate) + Send + Sync,
{
    fn redraw(&self, update: RedrawUpdate) {
        (self.callback)(update);
    }
}

/// Keeps every update in order; useful for headless hosts and reports.
#[derive(Debug, Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<RedrawUpdate>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<RedrawUpdate> {
        self.updates.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<RedrawUpdate> {
        std::mem::take(&mut *self.updates.lock())
    }

    /// Most recent update for a [`RedrawUpdate::target`].
    pub fn last_for(&self, target: &str) -> Option<RedrawUpdate> {
        self.updates
            .lock()
            .iter()
            .rev()
            .find(|u| u.target() == target)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.updates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.lock().is_empty()
    }
}

impl RedrawSink for RecordingSink {
    fn redraw(&self, update: RedrawUpdate) {
        self.updates.lock().push(update);
    }
}

static_assertions::assert_impl_all!(RecordingSink: Send, Sync);
static_assertions::assert_impl_all!(NullSink: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn status(selected: usize) -> RedrawUpdate {
        RedrawUpdate::Status(StatusSummary {
            selected,
            total: 10,
        })
    }

    #[test]
    fn test_closure_sink_receives_updates() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let sink = ClosureRedrawSink::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        sink.redraw(status(1));
        sink.redraw(status(2));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_recording_sink_last_for() {
        let sink = RecordingSink::new();
        sink.redraw(status(1));
        sink.redraw(status(4));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.last_for("status"), Some(status(4)));
        assert!(sink.last_for("kde:A").is_none());
        assert_eq!(sink.take().len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_update_serializes_with_kind_tag() {
        let json = serde_json::to_string(&status(3)).unwrap();
        assert!(json.contains(r#""kind":"status""#));
        assert!(json.contains(r#""selected":3"#));
    }
}
