//! Line-oriented control surface.
//!
//! Reads one command per line and applies it to the [`Scheduler`]:
//!
//! | Command            | Effect                                      |
//! |--------------------|---------------------------------------------|
//! | `play`, `start`    | Start, or resume after a stop               |
//! | `stop`, `pause`    | Cancel the pending tick, keep replay state  |
//! | `status`           | Print a JSON snapshot of the session        |
//! | `quit`, `exit`     | Leave the control loop                      |
//!
//! The loop also returns once the timeline is exhausted. At end of input it
//! lets a running replay finish before returning.

use std::str::FromStr;

use feedrace_core::Scheduler;
use feedrace_core::render::RenderAdapter;
use feedrace_types::PlaybackPhase;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};
use tracing::{info, warn};

use crate::error::PlayerError;

/// A parsed control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start or resume playback.
    Play,
    /// Stop playback.
    Stop,
    /// Print the current session snapshot.
    Status,
    /// Leave the control loop.
    Quit,
}

/// A line that is not a known command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command `{0}` (expected play, stop, status, or quit)")]
pub struct UnknownCommand(String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" | "start" => Ok(Self::Play),
            "stop" | "pause" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(UnknownCommand(other.to_owned())),
        }
    }
}

enum Input {
    Line(Option<String>),
    Ended,
}

/// Apply commands from `input` until `quit`, end of input, or the end of
/// the timeline.
pub async fn run<R, I>(scheduler: &mut Scheduler<R>, input: I) -> Result<(), PlayerError>
where
    R: RenderAdapter + 'static,
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut phase = scheduler.subscribe();

    loop {
        let next = tokio::select! {
            () = phase.ended() => Input::Ended,
            line = lines.next_line() => Input::Line(line?),
        };

        let line = match next {
            Input::Ended => {
                info!("Timeline exhausted, leaving control loop");
                return Ok(());
            }
            Input::Line(None) => {
                if scheduler.phase() == PlaybackPhase::Running {
                    info!("End of input, waiting for playback to finish");
                    phase.ended().await;
                }
                return Ok(());
            }
            Input::Line(Some(line)) => line,
        };

        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Play) => scheduler.start().await?,
            Ok(Command::Stop) => scheduler.stop().await?,
            Ok(Command::Status) => {
                let snapshot = scheduler.snapshot().await;
                info!(
                    phase = ?snapshot.phase,
                    ticks = snapshot.ticks,
                    time = snapshot.replay.current_time,
                    max_value = snapshot.max_value,
                    "Status"
                );
                println!("{}", serde_json::to_string(&snapshot)?);
            }
            Ok(Command::Quit) => {
                info!("Quit requested");
                return Ok(());
            }
            Err(err) => warn!(%err, "Ignoring control input"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use feedrace_core::config::PlaybackConfig;
    use feedrace_core::dataset::{Broadcast, RaceData, SelectedBroadcast};
    use feedrace_core::{NoOpRenderer, Pacing, PlaybackSession};

    use super::*;

    fn scheduler(wall: &[f64]) -> Scheduler<NoOpRenderer> {
        let empty = |id: &str| SelectedBroadcast {
            id: id.to_owned(),
            broadcast: Broadcast {
                post_times: Vec::new(),
                avg_rank: Vec::new(),
            },
        };
        let race = RaceData {
            wall_id: "wall".to_owned(),
            wall: wall.to_vec(),
            first: empty("a"),
            second: empty("b"),
        };
        let config = PlaybackConfig::default();
        Scheduler::new(
            PlaybackSession::new(race, &config),
            NoOpRenderer,
            Pacing::from_config(&config),
        )
    }

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!("play".parse::<Command>().unwrap(), Command::Play);
        assert_eq!(" START \n".parse::<Command>().unwrap(), Command::Play);
        assert_eq!("pause".parse::<Command>().unwrap(), Command::Stop);
        assert_eq!("status".parse::<Command>().unwrap(), Command::Status);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!(
            "rewind".parse::<Command>().unwrap_err(),
            UnknownCommand("rewind".to_owned())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_then_quit_leaves_playback_stopped() {
        let mut scheduler = scheduler(&[1.0, 2.0, 3.0]);
        run(&mut scheduler, &b"play\n\nbogus\nstop\nquit\nplay\n"[..])
            .await
            .unwrap();
        assert_eq!(scheduler.phase(), PlaybackPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_input_waits_for_running_playback() {
        let mut scheduler = scheduler(&[1.0, 2.0, 3.0]);
        run(&mut scheduler, &b"play\n"[..]).await.unwrap();
        assert_eq!(scheduler.phase(), PlaybackPhase::Ended);
        assert_eq!(scheduler.snapshot().await.ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_input_while_idle_returns() {
        let mut scheduler = scheduler(&[1.0]);
        run(&mut scheduler, &b"status\n"[..]).await.unwrap();
        assert_eq!(scheduler.phase(), PlaybackPhase::Idle);
    }
}
