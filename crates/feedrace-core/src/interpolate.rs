//! Step interpolation of sparse metric series.
//!
//! Raw performance samples arrive at irregular times. To draw them as a
//! piecewise-constant area, every raw sample `(t, v)` is preceded by a
//! held-value point `(t - ε, previous)`, which gives each change a
//! near-vertical edge. Plotted times strictly increase as long as raw sample
//! times do and every gap between them is wider than ε; the dataset loader
//! rejects repeated sample times.

use feedrace_types::SeriesPoint;

/// Default offset of the held-value point before each step edge.
pub const DEFAULT_STEP_EPSILON: f64 = 1e-6;

/// Extend `plotted` with every raw sample earlier than `end_time`, starting
/// at `cursor`, and return the cursor to resume from.
///
/// The held value before the first sample is the value of the last plotted
/// point, or `0` when nothing has been plotted yet. `plotted` is only ever
/// appended to, and calling again with the same `end_time` appends nothing.
pub fn update_till_time(
    plotted: &mut Vec<SeriesPoint>,
    raw: &[SeriesPoint],
    cursor: usize,
    end_time: f64,
    epsilon: f64,
) -> usize {
    let mut last_value = plotted.last().map_or(0.0, |point| point.value);
    let mut cursor = cursor;

    while let Some(point) = raw.get(cursor) {
        if point.time >= end_time {
            break;
        }
        plotted.push(SeriesPoint::new(point.time - epsilon, last_value));
        plotted.push(*point);
        last_value = point.value;
        cursor = cursor.saturating_add(1);
    }

    cursor
}

/// A raw series together with its incrementally built step rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSeries {
    raw: Vec<SeriesPoint>,
    plotted: Vec<SeriesPoint>,
    cursor: usize,
    epsilon: f64,
    max_value: Option<f64>,
}

impl StepSeries {
    /// Wrap a time-sorted raw series; nothing is plotted yet.
    pub const fn new(raw: Vec<SeriesPoint>, epsilon: f64) -> Self {
        Self {
            raw,
            plotted: Vec::new(),
            cursor: 0,
            epsilon,
            max_value: None,
        }
    }

    /// Plot every raw sample earlier than `end_time`.
    ///
    /// Returns the number of raw samples consumed by this call.
    pub fn extend_to(&mut self, end_time: f64) -> usize {
        let start = self.plotted.len();
        let cursor = update_till_time(
            &mut self.plotted,
            &self.raw,
            self.cursor,
            end_time,
            self.epsilon,
        );
        let consumed = cursor.saturating_sub(self.cursor);
        self.cursor = cursor;

        if let Some(new_points) = self.plotted.get(start..) {
            for point in new_points {
                let max = self.max_value.map_or(point.value, |max| max.max(point.value));
                self.max_value = Some(max);
            }
        }
        consumed
    }

    /// The step rendering built so far.
    pub fn plotted(&self) -> &[SeriesPoint] {
        &self.plotted
    }

    /// Index of the next raw sample to plot.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Largest plotted value, or `None` before anything is plotted.
    pub const fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    /// Whether every raw sample has been plotted.
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.raw.len()
    }
}
