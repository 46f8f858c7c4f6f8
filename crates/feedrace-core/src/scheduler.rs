//! Timeline scheduler: real-time pacing and start/stop control.
//!
//! The scheduler drives [`PlaybackSession::step`] from a single spawned
//! replay task. After each tick it sleeps for the tick's simulated delta,
//! scaled onto real time by [`Pacing`]:
//!
//! ```text
//! delay = (tick - previous_tick) * max_real_time / scaled_end_time
//! ```
//!
//! The task is held as a [`ScheduledStep`] handle. `stop` cancels through
//! that handle and waits for the task to finish, so the session is never
//! touched after `stop` returns and a later `start` resumes from exactly
//! where it left off.
//!
//! # Phases
//!
//! The current [`PlaybackPhase`] is published on a `watch` channel so
//! callers (the stdin control loop, tests) can await [`PlaybackPhase::Ended`]
//! while still issuing `start`/`stop`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feedrace_types::{EndReason, PlaybackPhase};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::render::RenderAdapter;
use crate::session::{PlaybackSession, SessionSnapshot, StepOutcome, TickSummary};

/// Errors that can occur while driving playback.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The replay task panicked.
    #[error("replay task failed: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

/// Maps simulated time onto real playback time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    scaled_end_time: f64,
    max_real_time_ms: f64,
}

impl Pacing {
    /// `scaled_end_time` simulated units play back over `max_real_time_ms`.
    pub const fn new(scaled_end_time: f64, max_real_time_ms: f64) -> Self {
        Self {
            scaled_end_time,
            max_real_time_ms,
        }
    }

    /// Pacing taken from a validated playback config.
    pub const fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.scaled_end_time, config.max_real_time_ms)
    }

    /// Real delay in milliseconds between two simulated instants.
    ///
    /// Never negative; a non-positive `scaled_end_time` yields zero.
    pub fn delay_ms(&self, previous: f64, next: f64) -> f64 {
        if self.scaled_end_time <= 0.0 {
            return 0.0;
        }
        let delay = (next - previous) * self.max_real_time_ms / self.scaled_end_time;
        if delay.is_finite() { delay.max(0.0) } else { 0.0 }
    }

    /// Real delay between two simulated instants.
    pub fn delay(&self, previous: f64, next: f64) -> Duration {
        Duration::try_from_secs_f64(self.delay_ms(previous, next) / 1000.0)
            .unwrap_or(Duration::ZERO)
    }
}

/// Handle to the pending replay task.
///
/// Dropping the handle detaches the task; use [`ScheduledStep::cancel`] to
/// stop it.
#[derive(Debug)]
pub struct ScheduledStep {
    handle: JoinHandle<()>,
}

impl ScheduledStep {
    fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Cancel the task and wait until it is gone.
    ///
    /// Cancelling a task that already finished is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Task`] if the task had panicked.
    pub async fn cancel(self) -> Result<(), SchedulerError> {
        self.handle.abort();
        Self::settle(self.handle.await)
    }

    /// Wait for the task to finish on its own.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Task`] if the task panicked.
    pub async fn join(self) -> Result<(), SchedulerError> {
        Self::settle(self.handle.await)
    }

    fn settle(result: Result<(), tokio::task::JoinError>) -> Result<(), SchedulerError> {
        match result {
            Err(err) if !err.is_cancelled() => Err(SchedulerError::from(err)),
            _ => Ok(()),
        }
    }
}

/// Outcome of a playback run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackResult {
    /// Why playback is over.
    pub end_reason: EndReason,
    /// Ticks replayed in total.
    pub total_ticks: u64,
    /// Simulated time of the last replayed event.
    pub final_time: f64,
    /// Wall-clock time of the first `start`, if playback ever started.
    pub started_at: Option<DateTime<Utc>>,
    /// Wall-clock time the result was produced.
    pub finished_at: DateTime<Utc>,
}

/// Receiver side of the published playback phase.
#[derive(Debug, Clone)]
pub struct PhaseWatch {
    rx: watch::Receiver<PlaybackPhase>,
}

impl PhaseWatch {
    /// The phase right now.
    pub fn current(&self) -> PlaybackPhase {
        *self.rx.borrow()
    }

    /// Wait until playback reaches [`PlaybackPhase::Ended`].
    ///
    /// Also returns if the scheduler is dropped.
    pub async fn ended(&mut self) {
        let _ = self
            .rx
            .wait_for(|phase| matches!(phase, PlaybackPhase::Ended))
            .await;
    }
}

/// State shared between the scheduler and its replay task.
struct Shared<R> {
    session: PlaybackSession,
    renderer: R,
}

/// Drives a [`PlaybackSession`] in real time.
pub struct Scheduler<R> {
    shared: Arc<Mutex<Shared<R>>>,
    pacing: Pacing,
    phase: Arc<watch::Sender<PlaybackPhase>>,
    pending: Option<ScheduledStep>,
    started_at: Option<DateTime<Utc>>,
}

impl<R: RenderAdapter + 'static> Scheduler<R> {
    /// Wrap a session; nothing runs until [`Scheduler::start`].
    pub fn new(session: PlaybackSession, renderer: R, pacing: Pacing) -> Self {
        let (phase, _) = watch::channel(PlaybackPhase::Idle);
        Self {
            shared: Arc::new(Mutex::new(Shared { session, renderer })),
            pacing,
            phase: Arc::new(phase),
            pending: None,
            started_at: None,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> PlaybackPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> PhaseWatch {
        PhaseWatch {
            rx: self.phase.subscribe(),
        }
    }

    /// Replay exactly one tick and render it without scheduling anything.
    ///
    /// Used to put a first point on the charts at load time. Only acts while
    /// [`PlaybackPhase::Idle`]; returns `None` otherwise, or if the timeline
    /// is empty (which moves the phase to [`PlaybackPhase::Ended`]).
    pub async fn prime(&mut self) -> Option<TickSummary> {
        if self.phase() != PlaybackPhase::Idle {
            return None;
        }
        let mut guard = self.shared.lock().await;
        let Shared { session, renderer } = &mut *guard;
        match session.step() {
            StepOutcome::Advanced(summary) => {
                session.render(renderer);
                debug!(time = summary.event.time, "Playback primed");
                Some(summary)
            }
            StepOutcome::Ended => {
                self.phase.send_replace(PlaybackPhase::Ended);
                info!("Nothing to replay, playback ended while priming");
                None
            }
        }
    }

    /// Start or resume playback.
    ///
    /// Replays one tick immediately, then keeps replaying ticks on the timer
    /// until the timeline ends or [`Scheduler::stop`] is called. A no-op
    /// while already running or after the timeline has ended.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Task`] if a previous replay task panicked.
    pub async fn start(&mut self) -> Result<(), SchedulerError> {
        let phase = self.phase();
        if !phase.can_start() {
            debug!(?phase, "start ignored");
            return Ok(());
        }
        if let Some(previous) = self.pending.take() {
            previous.cancel().await?;
        }

        self.started_at.get_or_insert_with(Utc::now);
        self.phase.send_replace(PlaybackPhase::Running);
        info!(resumed = phase == PlaybackPhase::Stopped, "Playback running");

        self.pending = Some(ScheduledStep::spawn(replay(
            Arc::clone(&self.shared),
            self.pacing,
            Arc::clone(&self.phase),
        )));
        Ok(())
    }

    /// Stop playback, cancelling any pending tick.
    ///
    /// Idempotent: stopping while idle, stopped, or ended changes nothing.
    /// The session keeps its replay state for a later [`Scheduler::start`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Task`] if the replay task had panicked.
    pub async fn stop(&mut self) -> Result<(), SchedulerError> {
        if let Some(step) = self.pending.take() {
            step.cancel().await?;
        }
        let stopped = self.phase.send_if_modified(|phase| {
            if *phase == PlaybackPhase::Running {
                *phase = PlaybackPhase::Stopped;
                true
            } else {
                false
            }
        });
        if stopped {
            info!("Playback stopped");
        }
        Ok(())
    }

    /// Wait for the replay task to finish, then report the result.
    ///
    /// Returns right away if nothing is running.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Task`] if the replay task panicked.
    pub async fn wait(&mut self) -> Result<PlaybackResult, SchedulerError> {
        if let Some(step) = self.pending.take() {
            step.join().await?;
        }
        Ok(self.result().await)
    }

    /// Stop anything pending and report the result.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Task`] if the replay task had panicked.
    pub async fn finish(&mut self) -> Result<PlaybackResult, SchedulerError> {
        self.stop().await?;
        Ok(self.result().await)
    }

    /// Copy out the session's observable state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let phase = self.phase();
        self.shared.lock().await.session.snapshot(phase)
    }

    async fn result(&self) -> PlaybackResult {
        let end_reason = if self.phase() == PlaybackPhase::Ended {
            EndReason::Exhausted
        } else {
            EndReason::Stopped
        };
        let guard = self.shared.lock().await;
        PlaybackResult {
            end_reason,
            total_ticks: guard.session.ticks(),
            final_time: guard.session.current_time(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

impl<R> Drop for Scheduler<R> {
    fn drop(&mut self) {
        if let Some(step) = self.pending.take() {
            step.handle.abort();
        }
    }
}

/// The replay task: step, render, sleep for the scaled delta, repeat.
async fn replay<R: RenderAdapter>(
    shared: Arc<Mutex<Shared<R>>>,
    pacing: Pacing,
    phase: Arc<watch::Sender<PlaybackPhase>>,
) {
    loop {
        let delay = {
            let mut guard = shared.lock().await;
            let Shared { session, renderer } = &mut *guard;
            match session.step() {
                StepOutcome::Advanced(summary) => {
                    session.render(renderer);
                    pacing.delay(summary.event.previous_time, summary.event.time)
                }
                StepOutcome::Ended => {
                    phase.send_replace(PlaybackPhase::Ended);
                    info!(
                        ticks = session.ticks(),
                        final_time = session.current_time(),
                        "Timeline exhausted, playback ended"
                    );
                    return;
                }
            }
        };
        tokio::time::sleep(delay).await;
    }
}

/// Log the end-of-playback summary.
pub fn log_playback_end(result: &PlaybackResult) {
    let elapsed_ms = result
        .started_at
        .map(|start| result.finished_at.signed_duration_since(start).num_milliseconds());
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_time = result.final_time,
        elapsed_ms,
        "Playback finished"
    );
    if result.total_ticks == 0 {
        warn!("Playback finished with no ticks replayed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use feedrace_types::{SeriesPoint, StreamKind, Track};
    use tokio::time::Instant;

    use super::*;
    use crate::dataset::{Broadcast, RaceData, SelectedBroadcast};
    use crate::feed::FeedBuffer;
    use crate::render::NoOpRenderer;

    fn race(wall: &[f64], first: &[f64], second: &[f64]) -> RaceData {
        let broadcast = |id: &str, times: &[f64]| SelectedBroadcast {
            id: id.to_owned(),
            broadcast: Broadcast {
                post_times: times.to_vec(),
                avg_rank: Vec::new(),
            },
        };
        RaceData {
            wall_id: "wall".to_owned(),
            wall: wall.to_vec(),
            first: broadcast("a", first),
            second: broadcast("b", second),
        }
    }

    fn scheduler(wall: &[f64], first: &[f64], second: &[f64]) -> Scheduler<NoOpRenderer> {
        let config = PlaybackConfig::default();
        let session = PlaybackSession::new(race(wall, first, second), &config);
        Scheduler::new(session, NoOpRenderer, Pacing::from_config(&config))
    }

    /// Yield long enough for the replay task to run its immediate step.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[test]
    fn delay_maps_simulated_delta_onto_real_time() {
        let pacing = Pacing::new(100.0, 60_000.0);
        assert_eq!(pacing.delay_ms(10.0, 20.0), 6000.0);
        assert_eq!(pacing.delay(10.0, 20.0), Duration::from_millis(6000));
    }

    #[test]
    fn delay_is_never_negative() {
        let pacing = Pacing::new(100.0, 60_000.0);
        assert_eq!(pacing.delay_ms(20.0, 10.0), 0.0);
        assert_eq!(pacing.delay(5.0, 5.0), Duration::ZERO);
        assert_eq!(Pacing::new(0.0, 60_000.0).delay_ms(0.0, 1.0), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_timeline_ends_without_scheduling() {
        let mut scheduler = scheduler(&[], &[], &[]);
        scheduler.start().await.unwrap();
        let result = scheduler.wait().await.unwrap();
        assert_eq!(scheduler.phase(), PlaybackPhase::Ended);
        assert_eq!(result.end_reason, EndReason::Exhausted);
        assert_eq!(result.total_ticks, 0);

        // Ended is terminal.
        scheduler.start().await.unwrap();
        assert_eq!(scheduler.phase(), PlaybackPhase::Ended);
        assert!(scheduler.pending.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_paced_by_simulated_deltas() {
        let mut scheduler = scheduler(&[10.0, 30.0], &[20.0], &[]);
        let begin = Instant::now();
        scheduler.start().await.unwrap();
        let result = scheduler.wait().await.unwrap();

        // Each tick sleeps for its own delta from the previous tick, so the
        // steps land at 0s (t=10), 6s (t=20), 12s (t=30) and the end at 18s.
        assert_eq!(result.total_ticks, 3);
        assert_eq!(result.final_time, 30.0);
        assert_eq!(result.end_reason, EndReason::Exhausted);
        assert_eq!(begin.elapsed(), Duration::from_secs(18));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_and_start_resumes() {
        let mut scheduler = scheduler(&[10.0, 20.0, 30.0], &[], &[]);
        scheduler.start().await.unwrap();
        settle().await;
        assert_eq!(scheduler.snapshot().await.ticks, 1);

        scheduler.stop().await.unwrap();
        assert_eq!(scheduler.phase(), PlaybackPhase::Stopped);

        tokio::time::sleep(Duration::from_secs(60)).await;
        let snapshot = scheduler.snapshot().await;
        assert_eq!(snapshot.ticks, 1);
        assert_eq!(snapshot.replay.cursor(StreamKind::Wall), 1);

        scheduler.start().await.unwrap();
        settle().await;
        let snapshot = scheduler.snapshot().await;
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.replay.current_time, 20.0);

        let result = scheduler.wait().await.unwrap();
        assert_eq!(result.total_ticks, 3);
        assert_eq!(scheduler.phase(), PlaybackPhase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let mut scheduler = scheduler(&[1.0], &[], &[]);
        scheduler.stop().await.unwrap();
        assert_eq!(scheduler.phase(), PlaybackPhase::Idle);

        scheduler.start().await.unwrap();
        scheduler.stop().await.unwrap();
        scheduler.stop().await.unwrap();
        assert_eq!(scheduler.phase(), PlaybackPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_is_a_no_op() {
        let mut scheduler = scheduler(&[10.0, 20.0], &[], &[]);
        scheduler.start().await.unwrap();
        settle().await;
        scheduler.start().await.unwrap();
        settle().await;
        assert_eq!(scheduler.snapshot().await.ticks, 1);
        assert_eq!(scheduler.phase(), PlaybackPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn prime_replays_one_tick_and_stays_idle() {
        let mut scheduler = scheduler(&[10.0, 20.0], &[], &[]);
        let summary = scheduler.prime().await.unwrap();
        assert_eq!(summary.event.time, 10.0);
        assert_eq!(scheduler.phase(), PlaybackPhase::Idle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(scheduler.snapshot().await.ticks, 1);

        // Priming is only for a fresh session.
        scheduler.start().await.unwrap();
        assert!(scheduler.prime().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn prime_on_empty_timeline_ends() {
        let mut scheduler = scheduler(&[], &[], &[]);
        assert!(scheduler.prime().await.is_none());
        assert_eq!(scheduler.phase(), PlaybackPhase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_watch_sees_the_end() {
        let mut scheduler = scheduler(&[1.0, 2.0], &[], &[]);
        let mut watch = scheduler.subscribe();
        assert_eq!(watch.current(), PlaybackPhase::Idle);
        scheduler.start().await.unwrap();
        watch.ended().await;
        assert_eq!(watch.current(), PlaybackPhase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_reports_stopped_when_halted_early() {
        let mut scheduler = scheduler(&[10.0, 20.0], &[], &[]);
        scheduler.start().await.unwrap();
        settle().await;
        let result = scheduler.finish().await.unwrap();
        assert_eq!(result.end_reason, EndReason::Stopped);
        assert_eq!(result.total_ticks, 1);
        assert!(result.started_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn renderer_sees_every_tick() {
        #[derive(Clone, Default)]
        struct Recorder(Arc<StdMutex<Vec<Vec<u64>>>>);
        impl RenderAdapter for Recorder {
            fn render_feed(&mut self, track: Track, feed: &FeedBuffer) {
                if track == Track::First {
                    let ids = feed.ids().into_iter().map(u64::from).collect();
                    self.0.lock().unwrap().push(ids);
                }
            }
            fn render_performance(&mut self, _: Track, _: &[SeriesPoint], _: f64) {}
        }

        let config = PlaybackConfig {
            feed_length: 2,
            ..PlaybackConfig::default()
        };
        let session = PlaybackSession::new(race(&[1.0, 2.0], &[1.5], &[]), &config);
        let recorder = Recorder::default();
        let mut scheduler = Scheduler::new(session, recorder.clone(), Pacing::from_config(&config));
        scheduler.start().await.unwrap();
        scheduler.wait().await.unwrap();

        let frames = recorder.0.lock().unwrap().clone();
        assert_eq!(frames, vec![vec![1], vec![2, 1], vec![3, 2]]);
    }
}
