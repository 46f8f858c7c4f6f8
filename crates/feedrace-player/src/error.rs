//! Error types for the player binary.
//!
//! [`PlayerError`] is the top-level error type that wraps all possible
//! failure modes during startup and playback.

/// Top-level error for the player binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: feedrace_core::ConfigError,
    },

    /// The dataset could not be loaded or the configured sources are missing.
    #[error("dataset error: {source}")]
    Dataset {
        /// The underlying dataset error.
        #[from]
        source: feedrace_core::DatasetError,
    },

    /// The replay task failed.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: feedrace_core::SchedulerError,
    },

    /// Reading commands from stdin failed.
    #[error("control input error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A status snapshot could not be serialized.
    #[error("status encoding error: {source}")]
    Status {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
