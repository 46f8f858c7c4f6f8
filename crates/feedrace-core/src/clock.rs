//! Event-merge clock: the single source of truth for simulated time.
//!
//! The clock owns the wall stream and both broadcast streams. Each
//! [`MergeClock::step`] picks the earliest pending event across the three,
//! advances exactly that stream's cursor, moves simulated time to the event,
//! and hands back the classified [`MergedEvent`] with a freshly allocated
//! entry id.
//!
//! # Tie-break
//!
//! Streams with an event at the same instant are not fanned out into one
//! tick. The winner is chosen by [`StreamKind::PRIORITY`] (wall, then the
//! first algorithm, then the second); the others keep their cursors and win
//! on later ticks at the same simulated time.

use std::collections::BTreeMap;

use feedrace_types::{EntryId, FeedEntry, StreamKind, Track};
use serde::Serialize;

use crate::source::EventSource;

/// A single globally-ordered event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedEvent {
    /// Simulated time of the event.
    pub time: f64,
    /// Simulated time before this event was replayed.
    pub previous_time: f64,
    /// Which stream produced it.
    pub stream: StreamKind,
    /// The post to show in the recipient feeds.
    pub entry: FeedEntry,
}

impl MergedEvent {
    /// Feeds that receive this event's entry.
    pub const fn recipients(&self) -> &'static [Track] {
        self.stream.recipients()
    }
}

/// Result of asking the clock for the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeOutcome {
    /// An event was replayed.
    Tick(MergedEvent),
    /// Every stream is exhausted; there are no more ticks.
    Ended,
}

/// Read-only view of the clock's mutable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayState {
    /// Simulated time of the last replayed event (0 before the first).
    pub current_time: f64,
    /// Cursor of each stream.
    pub cursors: BTreeMap<StreamKind, usize>,
}

impl ReplayState {
    /// Cursor of one stream.
    pub fn cursor(&self, stream: StreamKind) -> usize {
        self.cursors.get(&stream).copied().unwrap_or(0)
    }
}

/// Merges the wall and both broadcast streams into one timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeClock {
    wall: EventSource,
    first: EventSource,
    second: EventSource,
    current_time: f64,
    last_id: EntryId,
}

impl MergeClock {
    /// Create a clock at simulated time 0 with all cursors at the start.
    pub const fn new(wall: EventSource, first: EventSource, second: EventSource) -> Self {
        Self {
            wall,
            first,
            second,
            current_time: 0.0,
            last_id: EntryId::ZERO,
        }
    }

    /// The stream and time of the next event, without replaying it.
    ///
    /// Returns `None` when every stream is exhausted.
    pub fn peek(&self) -> Option<(StreamKind, f64)> {
        select_next(
            self.wall.next_time(),
            self.first.next_time(),
            self.second.next_time(),
        )
    }

    /// Replay the next event.
    ///
    /// Advances exactly one cursor, moves simulated time to the event, and
    /// allocates the next entry id. Once every stream is exhausted this
    /// keeps returning [`MergeOutcome::Ended`] without touching any state.
    pub fn step(&mut self) -> MergeOutcome {
        let Some((stream, time)) = self.peek() else {
            return MergeOutcome::Ended;
        };

        self.source_mut(stream).advance();
        let previous_time = self.current_time;
        self.current_time = time;
        self.last_id = self.last_id.next();

        MergeOutcome::Tick(MergedEvent {
            time,
            previous_time,
            stream,
            entry: FeedEntry::new(self.last_id, stream.post_source()),
        })
    }

    /// Whether every stream is exhausted.
    pub fn is_ended(&self) -> bool {
        self.peek().is_none()
    }

    /// Simulated time of the last replayed event.
    pub const fn current_time(&self) -> f64 {
        self.current_time
    }

    /// The most recently allocated entry id ([`EntryId::ZERO`] before the first).
    pub const fn last_id(&self) -> EntryId {
        self.last_id
    }

    /// Borrow one of the three streams.
    pub const fn source(&self, stream: StreamKind) -> &EventSource {
        match stream {
            StreamKind::Wall => &self.wall,
            StreamKind::First => &self.first,
            StreamKind::Second => &self.second,
        }
    }

    /// Snapshot of simulated time and all cursors.
    pub fn replay_state(&self) -> ReplayState {
        ReplayState {
            current_time: self.current_time,
            cursors: StreamKind::PRIORITY
                .iter()
                .map(|&stream| (stream, self.source(stream).cursor()))
                .collect(),
        }
    }

    /// Total events not yet replayed across all streams.
    pub fn remaining(&self) -> usize {
        self.wall
            .remaining()
            .saturating_add(self.first.remaining())
            .saturating_add(self.second.remaining())
    }

    const fn source_mut(&mut self, stream: StreamKind) -> &mut EventSource {
        match stream {
            StreamKind::Wall => &mut self.wall,
            StreamKind::First => &mut self.first,
            StreamKind::Second => &mut self.second,
        }
    }
}

/// Pick the earliest of three candidate times, breaking ties by priority.
///
/// Exhausted streams report [`crate::source::UNBOUNDED`]; if all three do,
/// there is no next event.
fn select_next(wall: f64, first: f64, second: f64) -> Option<(StreamKind, f64)> {
    let next = wall.min(first).min(second);
    if !next.is_finite() {
        return None;
    }
    let stream = if wall <= first && wall <= second {
        StreamKind::Wall
    } else if first <= second {
        StreamKind::First
    } else {
        StreamKind::Second
    };
    Some((stream, next))
}
