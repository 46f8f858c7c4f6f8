//! Rendering adapter trait and stub implementation.
//!
//! After every replayed tick the session hands its derived outputs to a
//! [`RenderAdapter`]: both feed buffers and both plotted step sequences.
//! The adapter owns drawing. It could be a browser bridge, a terminal view,
//! a log sink, or a test recorder. It only reads; it never mutates replay
//! state.

use feedrace_types::{SeriesPoint, Track};

use crate::feed::FeedBuffer;

/// Consumer of per-tick replay output.
pub trait RenderAdapter: Send {
    /// Redraw one track's feed. Entries are newest first.
    fn render_feed(&mut self, track: Track, feed: &FeedBuffer);

    /// Redraw one track's performance chart.
    ///
    /// `current_max_value` is the running maximum across both tracks, so
    /// both charts can share a y-axis.
    fn render_performance(&mut self, track: Track, plotted: &[SeriesPoint], current_max_value: f64);
}

/// A renderer that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRenderer;

impl RenderAdapter for NoOpRenderer {
    fn render_feed(&mut self, _track: Track, _feed: &FeedBuffer) {}

    fn render_performance(&mut self, _track: Track, _plotted: &[SeriesPoint], _max: f64) {}
}

impl<R: RenderAdapter + ?Sized> RenderAdapter for Box<R> {
    fn render_feed(&mut self, track: Track, feed: &FeedBuffer) {
        (**self).render_feed(track, feed);
    }

    fn render_performance(
        &mut self,
        track: Track,
        plotted: &[SeriesPoint],
        current_max_value: f64,
    ) {
        (**self).render_performance(track, plotted, current_max_value);
    }
}
