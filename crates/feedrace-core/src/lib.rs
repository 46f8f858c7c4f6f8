//! Event merge, step interpolation, and real-time replay for the feed race.
//!
//! This crate owns the replay pipeline that turns three timestamped event
//! streams into an animated race between two posting algorithms:
//! Merge, Route, Interpolate, Render, Sleep.
//!
//! # Modules
//!
//! - [`source`] -- Cursor over one sorted timestamp stream.
//! - [`clock`] -- [`MergeClock`], the three-way merge with fixed tie-break
//!   priority and monotonically allocated entry ids.
//! - [`interpolate`] -- Incremental step-function rendering of a series.
//! - [`feed`] -- Bounded newest-first feed buffers.
//! - [`session`] -- [`PlaybackSession`], one tick of the whole pipeline.
//! - [`scheduler`] -- [`Scheduler`], real-time pacing with start/stop.
//! - [`render`] -- [`RenderAdapter`], the seam to whatever draws the race.
//! - [`dataset`] -- JSON dataset loading and source selection.
//! - [`config`] -- Configuration loading from `feedrace-config.yaml` into
//!   strongly-typed structs.
//!
//! [`MergeClock`]: clock::MergeClock
//! [`PlaybackSession`]: session::PlaybackSession
//! [`Scheduler`]: scheduler::Scheduler
//! [`RenderAdapter`]: render::RenderAdapter

pub mod clock;
pub mod config;
pub mod dataset;
pub mod feed;
pub mod interpolate;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod source;

pub use clock::{MergeClock, MergeOutcome, MergedEvent, ReplayState};
pub use config::{ConfigError, PlayerConfig};
pub use dataset::{Dataset, DatasetError, RaceData};
pub use feed::FeedBuffer;
pub use render::{NoOpRenderer, RenderAdapter};
pub use scheduler::{Pacing, PlaybackResult, Scheduler, SchedulerError};
pub use session::{PlaybackSession, SessionSnapshot, StepOutcome, TickSummary};
