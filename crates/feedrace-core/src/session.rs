//! Playback session: everything one replay owns, advanced one tick at a time.
//!
//! A [`PlaybackSession`] bundles the merge clock, the two feed buffers, the
//! two step-interpolated performance series, and the running maximum used
//! for the shared chart axis. [`PlaybackSession::step`] is the unit of work
//! the scheduler repeats:
//!
//! 1. **Merge** -- ask the [`MergeClock`] for the next global event.
//! 2. **Deliver** -- push the new entry onto each recipient feed (trimming
//!    to `feed_length`).
//! 3. **Interpolate** -- extend both plotted series up to the event time.
//! 4. **Rescale** -- raise the running maximum if a new value exceeds it.
//!
//! The step is deterministic given the same dataset and configuration.

use feedrace_types::{FeedEntry, PlaybackPhase, SeriesPoint, StreamKind, Track};
use serde::Serialize;
use tracing::debug;

use crate::clock::{MergeClock, MergeOutcome, MergedEvent, ReplayState};
use crate::config::PlaybackConfig;
use crate::dataset::RaceData;
use crate::feed::FeedBuffer;
use crate::interpolate::StepSeries;
use crate::render::RenderAdapter;
use crate::source::EventSource;

/// A value for each of the two tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerTrack<T> {
    /// Value for [`Track::First`].
    pub first: T,
    /// Value for [`Track::Second`].
    pub second: T,
}

impl<T> PerTrack<T> {
    /// Build from one value per track.
    pub const fn new(first: T, second: T) -> Self {
        Self { first, second }
    }

    /// Borrow the value for `track`.
    pub const fn get(&self, track: Track) -> &T {
        match track {
            Track::First => &self.first,
            Track::Second => &self.second,
        }
    }

    /// Mutably borrow the value for `track`.
    pub const fn get_mut(&mut self, track: Track) -> &mut T {
        match track {
            Track::First => &mut self.first,
            Track::Second => &mut self.second,
        }
    }

    /// Apply `f` to both values.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerTrack<U> {
        PerTrack {
            first: f(&self.first),
            second: f(&self.second),
        }
    }
}

/// Summary of a single replayed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// 1-based count of ticks replayed so far, this one included.
    pub tick: u64,
    /// The merged event.
    pub event: MergedEvent,
    /// Raw metric samples newly plotted, per track.
    pub samples_plotted: PerTrack<usize>,
    /// Feed entries dropped by truncation this tick.
    pub entries_dropped: usize,
    /// Running maximum after this tick.
    pub max_value: f64,
}

/// Result of one session step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A tick was replayed.
    Advanced(TickSummary),
    /// Nothing left to replay.
    Ended,
}

/// Serializable copy of a session's observable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Scheduler phase at the time of the snapshot.
    pub phase: PlaybackPhase,
    /// Simulated time and stream cursors.
    pub replay: ReplayState,
    /// Feed contents, newest first.
    pub feeds: PerTrack<Vec<FeedEntry>>,
    /// Plotted step sequences.
    pub plotted: PerTrack<Vec<SeriesPoint>>,
    /// Running maximum for the shared chart axis.
    pub max_value: f64,
    /// Ticks replayed so far.
    pub ticks: u64,
}

/// The mutable state of one replay.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    clock: MergeClock,
    feeds: PerTrack<FeedBuffer>,
    series: PerTrack<StepSeries>,
    max_value: f64,
    ticks: u64,
}

impl PlaybackSession {
    /// Build a fresh session over the selected race data.
    pub fn new(race: RaceData, config: &PlaybackConfig) -> Self {
        let RaceData {
            wall, first, second, ..
        } = race;
        let epsilon = config.step_epsilon;

        Self {
            clock: MergeClock::new(
                EventSource::new(wall),
                EventSource::new(first.broadcast.post_times),
                EventSource::new(second.broadcast.post_times),
            ),
            feeds: PerTrack::new(
                FeedBuffer::new(config.feed_length),
                FeedBuffer::new(config.feed_length),
            ),
            series: PerTrack::new(
                StepSeries::new(first.broadcast.avg_rank, epsilon),
                StepSeries::new(second.broadcast.avg_rank, epsilon),
            ),
            max_value: config.initial_max_value,
            ticks: 0,
        }
    }

    /// Replay the next event and update every derived output.
    pub fn step(&mut self) -> StepOutcome {
        let event = match self.clock.step() {
            MergeOutcome::Tick(event) => event,
            MergeOutcome::Ended => return StepOutcome::Ended,
        };

        let mut entries_dropped: usize = 0;
        for &track in event.recipients() {
            let dropped = self.feeds.get_mut(track).push(event.entry);
            entries_dropped = entries_dropped.saturating_add(dropped);
        }

        let samples_plotted = PerTrack::new(
            self.series.first.extend_to(event.time),
            self.series.second.extend_to(event.time),
        );

        for track in Track::ALL {
            if let Some(track_max) = self.series.get(track).max_value() {
                self.max_value = self.max_value.max(track_max);
            }
        }

        self.ticks = self.ticks.saturating_add(1);

        debug!(
            tick = self.ticks,
            time = event.time,
            stream = ?event.stream,
            entry_id = %event.entry.id,
            max_value = self.max_value,
            "Tick replayed"
        );

        StepOutcome::Advanced(TickSummary {
            tick: self.ticks,
            event,
            samples_plotted,
            entries_dropped,
            max_value: self.max_value,
        })
    }

    /// Hand both feeds and both charts to `renderer`.
    pub fn render<A: RenderAdapter + ?Sized>(&self, renderer: &mut A) {
        for track in Track::ALL {
            renderer.render_feed(track, self.feeds.get(track));
        }
        for track in Track::ALL {
            renderer.render_performance(track, self.series.get(track).plotted(), self.max_value);
        }
    }

    /// One track's feed buffer.
    pub const fn feed(&self, track: Track) -> &FeedBuffer {
        self.feeds.get(track)
    }

    /// One track's plotted step sequence.
    pub fn plotted(&self, track: Track) -> &[SeriesPoint] {
        self.series.get(track).plotted()
    }

    /// Running maximum across both charts.
    pub const fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Ticks replayed so far.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time of the last replayed event.
    pub const fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    /// Whether every stream is exhausted.
    pub fn is_ended(&self) -> bool {
        self.clock.is_ended()
    }

    /// Time and stream of the next event, if any.
    pub fn peek(&self) -> Option<(StreamKind, f64)> {
        self.clock.peek()
    }

    /// Simulated time and stream cursors.
    pub fn replay_state(&self) -> ReplayState {
        self.clock.replay_state()
    }

    /// Copy out the observable state.
    pub fn snapshot(&self, phase: PlaybackPhase) -> SessionSnapshot {
        SessionSnapshot {
            phase,
            replay: self.replay_state(),
            feeds: self.feeds.map(FeedBuffer::to_vec),
            plotted: self.series.map(|series| series.plotted().to_vec()),
            max_value: self.max_value,
            ticks: self.ticks,
        }
    }
}
