//! Feed race player.
//!
//! This is the main entry point that wires together the dataset, the
//! playback session, the real-time scheduler, and the stdin control
//! surface. It loads configuration, selects the race sources, and replays
//! the race until it is exhausted or the operator quits.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first CLI argument, else `feedrace-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the dataset and select the wall and both broadcasts
//! 4. Build the playback session and scheduler
//! 5. Prime the first tick and optionally start playback
//! 6. Run the control loop on stdin
//! 7. Log the result

mod control;
mod error;
mod log_renderer;

use std::path::{Path, PathBuf};

use feedrace_core::config::{LogFormat, LoggingConfig, PlayerConfig};
use feedrace_core::scheduler::log_playback_end;
use feedrace_core::{Dataset, Pacing, PlaybackSession, Scheduler};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::PlayerError;
use crate::log_renderer::LogRenderer;

/// Config file looked up in the working directory when no path is given.
const DEFAULT_CONFIG_PATH: &str = "feedrace-config.yaml";

/// Application entry point for the player.
///
/// # Errors
///
/// Returns an error if configuration, dataset loading, or playback fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("feedrace-player starting");
    info!(
        data = %config.data.path.display(),
        feed_length = config.playback.feed_length,
        scaled_end_time = config.playback.scaled_end_time,
        max_real_time_ms = config.playback.max_real_time_ms,
        "Configuration loaded"
    );

    run(&config).await?;
    Ok(())
}

async fn run(config: &PlayerConfig) -> Result<(), PlayerError> {
    // 3. Load the dataset and pick the racing sources.
    let dataset = Dataset::from_file(&config.data.path)?;
    let race = dataset.select(&config.data)?;
    info!(
        wall = %race.wall_id,
        first = %race.first.id,
        second = %race.second.id,
        wall_events = race.wall.len(),
        first_posts = race.first.broadcast.post_times.len(),
        second_posts = race.second.broadcast.post_times.len(),
        "Race selected"
    );

    // 4. Build session and scheduler.
    let session = PlaybackSession::new(race, &config.playback);
    let mut scheduler = Scheduler::new(
        session,
        LogRenderer::default(),
        Pacing::from_config(&config.playback),
    );

    // 5. Draw the first point, then optionally start right away.
    if config.playback.prime_on_load {
        scheduler.prime().await;
    }
    if config.playback.autoplay {
        scheduler.start().await?;
    } else {
        info!("Ready, type `play` to start");
    }

    // 6. Control loop.
    control::run(&mut scheduler, BufReader::new(tokio::io::stdin())).await?;

    // 7. Stop whatever is pending and report.
    let result = scheduler.finish().await?;
    log_playback_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "feedrace-player shutdown complete"
    );
    Ok(())
}

/// Load the player configuration.
///
/// An explicit path must exist. Without one, `feedrace-config.yaml` in the
/// working directory is used if present, else defaults.
fn load_config(path: Option<&Path>) -> Result<PlayerConfig, PlayerError> {
    if let Some(path) = path {
        return Ok(PlayerConfig::from_file(path)?);
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok(PlayerConfig::from_file(default_path)?)
    } else {
        let mut config = PlayerConfig::default();
        config.data.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Logs go to stderr; stdout carries `status` output.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}
