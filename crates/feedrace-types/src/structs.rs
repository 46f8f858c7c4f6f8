//! Core data structs: feed entries and series samples.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::PostSource;
use crate::ids::EntryId;

/// A single post in a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FeedEntry {
    /// Globally unique, increasing id.
    pub id: EntryId,
    /// Whether the feed's own algorithm or the world posted it.
    pub source: PostSource,
}

impl FeedEntry {
    /// Create a feed entry.
    pub const fn new(id: EntryId, source: PostSource) -> Self {
        Self { id, source }
    }
}

/// A `(time, value)` sample of a performance metric.
///
/// Used both for the raw `avg_rank` samples and for the plotted step
/// sequence derived from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SeriesPoint {
    /// Simulated time of the sample.
    pub time: f64,
    /// Metric value at `time`.
    pub value: f64,
}

impl SeriesPoint {
    /// Create a sample.
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

impl From<(f64, f64)> for SeriesPoint {
    fn from((time, value): (f64, f64)) -> Self {
        Self { time, value }
    }
}
