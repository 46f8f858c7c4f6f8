//! Enumeration types for the feed race replay.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Feed attribution
// ---------------------------------------------------------------------------

/// Who authored a post as seen from a tracked feed.
///
/// A post by the tracked algorithm is `User`; everything the rest of the
/// world posts is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum PostSource {
    /// Posted by the algorithm that owns the feed.
    User,
    /// Posted by the background world.
    Other,
}

/// One of the two racing algorithms, and the feed/chart pair that belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// The first selected broadcast.
    First,
    /// The second selected broadcast.
    Second,
}

impl Track {
    /// Both tracks in display order.
    pub const ALL: [Self; 2] = [Self::First, Self::Second];

    /// The event stream carrying this track's posts.
    pub const fn stream(self) -> StreamKind {
        match self {
            Self::First => StreamKind::First,
            Self::Second => StreamKind::Second,
        }
    }
}

/// One of the three timestamped streams merged into the global timeline.
///
/// Declaration order is the tie-break priority: when two streams have an
/// event at the same instant, the earlier variant wins the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Background posts from the rest of the world.
    Wall,
    /// Posts by the first algorithm.
    First,
    /// Posts by the second algorithm.
    Second,
}

impl StreamKind {
    /// All streams in tie-break priority order.
    pub const PRIORITY: [Self; 3] = [Self::Wall, Self::First, Self::Second];

    /// The track owning this stream, or `None` for the wall.
    pub const fn track(self) -> Option<Track> {
        match self {
            Self::Wall => None,
            Self::First => Some(Track::First),
            Self::Second => Some(Track::Second),
        }
    }

    /// How a post from this stream is labelled inside a feed.
    pub const fn post_source(self) -> PostSource {
        match self {
            Self::Wall => PostSource::Other,
            Self::First | Self::Second => PostSource::User,
        }
    }

    /// The feeds a post from this stream is delivered to.
    ///
    /// Wall posts are broadcast to both feeds; an algorithm's own posts only
    /// reach that algorithm's feed.
    pub const fn recipients(self) -> &'static [Track] {
        match self {
            Self::Wall => &Track::ALL,
            Self::First => &[Track::First],
            Self::Second => &[Track::Second],
        }
    }
}

// ---------------------------------------------------------------------------
// Playback lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle phase of a playback session.
///
/// ```text
/// Idle --start--> Running --stop--> Stopped --start--> Running
///                    |
///                    +--(no events left)--> Ended
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// Nothing scheduled yet.
    #[default]
    Idle,
    /// A replay step is pending on the timer.
    Running,
    /// Halted by an operator; resumable from the saved replay state.
    Stopped,
    /// Every stream is exhausted. Terminal.
    Ended,
}

impl PlaybackPhase {
    /// Whether `start` may schedule work from this phase.
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Stopped)
    }
}

/// Why a playback run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// All three streams ran out of events.
    Exhausted,
    /// Playback was halted before the timeline was exhausted.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_posts_reach_both_feeds() {
        assert_eq!(StreamKind::Wall.recipients(), &[Track::First, Track::Second]);
        assert_eq!(StreamKind::Wall.post_source(), PostSource::Other);
    }

    #[test]
    fn algorithm_posts_stay_on_their_own_feed() {
        assert_eq!(StreamKind::First.recipients(), &[Track::First]);
        assert_eq!(StreamKind::Second.recipients(), &[Track::Second]);
        assert_eq!(StreamKind::Second.post_source(), PostSource::User);
    }

    #[test]
    fn priority_follows_declaration_order() {
        let mut sorted = StreamKind::PRIORITY;
        sorted.sort();
        assert_eq!(sorted, StreamKind::PRIORITY);
        assert_eq!(StreamKind::PRIORITY.first(), Some(&StreamKind::Wall));
    }

    #[test]
    fn track_stream_round_trip() {
        for track in Track::ALL {
            assert_eq!(track.stream().track(), Some(track));
        }
        assert_eq!(StreamKind::Wall.track(), None);
    }

    #[test]
    fn post_source_uses_lowercase_names() {
        let json = serde_json::to_string(&PostSource::Other).unwrap_or_default();
        assert_eq!(json, "\"other\"");
    }

    #[test]
    fn only_idle_and_stopped_can_start() {
        assert!(PlaybackPhase::Idle.can_start());
        assert!(PlaybackPhase::Stopped.can_start());
        assert!(!PlaybackPhase::Running.can_start());
        assert!(!PlaybackPhase::Ended.can_start());
    }
}
