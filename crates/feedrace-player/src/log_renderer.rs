//! Render adapter that writes each frame to the log.
//!
//! There is no UI in the player; feed and chart updates go out as
//! `debug`/`trace` events so a run can be followed with
//! `RUST_LOG=feedrace_player=debug`.

use feedrace_core::feed::FeedBuffer;
use feedrace_core::render::RenderAdapter;
use feedrace_types::{SeriesPoint, Track};
use tracing::{debug, trace};

/// Logs every rendered feed and chart.
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
}

impl LogRenderer {
    /// Feed frames rendered so far, across both tracks.
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderAdapter for LogRenderer {
    fn render_feed(&mut self, track: Track, feed: &FeedBuffer) {
        self.frames = self.frames.saturating_add(1);
        let newest = feed.latest().map(|entry| entry.id);
        debug!(
            ?track,
            len = feed.len(),
            newest = ?newest,
            source = ?feed.latest().map(|entry| entry.source),
            "Feed"
        );
        trace!(?track, ids = ?feed.ids(), "Feed contents");
    }

    fn render_performance(
        &mut self,
        track: Track,
        plotted: &[SeriesPoint],
        current_max_value: f64,
    ) {
        let last = plotted.last();
        debug!(
            ?track,
            points = plotted.len(),
            time = last.map(|point| point.time),
            value = last.map(|point| point.value),
            max_value = current_max_value,
            "Performance"
        );
    }
}
