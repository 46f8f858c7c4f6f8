//! A timestamped event stream with a replay cursor.

/// Sentinel next-time for an exhausted stream: later than every real time.
pub const UNBOUNDED: f64 = f64::INFINITY;

/// An immutable, non-decreasing sequence of event times plus a cursor
/// marking the next event to replay.
///
/// The cursor only moves forward and never passes `len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSource {
    times: Vec<f64>,
    cursor: usize,
}

impl EventSource {
    /// Wrap a sorted list of event times, cursor at the first event.
    pub const fn new(times: Vec<f64>) -> Self {
        Self { times, cursor: 0 }
    }

    /// Time of the event under the cursor, or [`UNBOUNDED`] once exhausted.
    pub fn next_time(&self) -> f64 {
        self.times.get(self.cursor).copied().unwrap_or(UNBOUNDED)
    }

    /// Move past the current event.
    ///
    /// Returns `false` (and leaves the cursor alone) if the stream is
    /// already exhausted.
    pub fn advance(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.cursor = self.cursor.saturating_add(1);
        true
    }

    /// Index of the next event to replay.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of events in the stream.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the stream has no events at all.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Whether every event has been replayed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.times.len()
    }

    /// Number of events not yet replayed.
    pub fn remaining(&self) -> usize {
        self.times.len().saturating_sub(self.cursor)
    }
}
