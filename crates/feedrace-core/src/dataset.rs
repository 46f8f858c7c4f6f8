//! Dataset loading and source selection.
//!
//! A dataset is a JSON document exported by the simulator:
//!
//! ```json
//! {
//!   "walls":      { "<id>": [t0, t1, ...], ... },
//!   "broadcasts": { "<id>": { "post_times": [t0, ...],
//!                             "performance": { "avg_rank": [[t, v], ...] } },
//!                   ... }
//! }
//! ```
//!
//! Loading is fail-fast. A missing key, a non-finite time, or an
//! out-of-order sequence is reported before any playback starts.
//! Unrecognised keys are ignored. The replay only ever sees a validated
//! [`RaceData`].

use std::path::Path;

use feedrace_types::SeriesPoint;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::DataConfig;

/// Errors that can occur while loading or selecting from a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Failed to read the dataset file from disk.
    #[error("failed to read dataset: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The document is not valid JSON or lacks a required key.
    #[error("malformed dataset: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A stream contains a NaN or infinite number.
    #[error("stream `{stream}` has a non-finite number at index {index}")]
    NonFinite {
        /// The stream that failed validation.
        stream: String,
        /// Position of the offending sample.
        index: usize,
    },

    /// A stream's timestamps go backwards.
    #[error("stream `{stream}` is not sorted by time at index {index}")]
    Unsorted {
        /// The stream that failed validation.
        stream: String,
        /// Position of the first sample earlier than its predecessor.
        index: usize,
    },

    /// Two metric samples share a timestamp.
    #[error("stream `{stream}` repeats the sample time at index {index}")]
    DuplicateSampleTime {
        /// The stream that failed validation.
        stream: String,
        /// Position of the second sample with the repeated time.
        index: usize,
    },

    /// The dataset has no wall at all.
    #[error("dataset contains no walls")]
    NoWalls,

    /// The dataset has fewer than two broadcasts to race.
    #[error("dataset contains {found} broadcast(s); two are needed")]
    NotEnoughBroadcasts {
        /// Number of broadcasts present.
        found: usize,
    },

    /// A configured wall id is not in the dataset.
    #[error("wall `{id}` not found in dataset")]
    UnknownWall {
        /// The requested id.
        id: String,
    },

    /// A configured broadcast id is not in the dataset.
    #[error("broadcast `{id}` not found in dataset")]
    UnknownBroadcast {
        /// The requested id.
        id: String,
    },
}

/// One algorithm's posting record.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    /// When the algorithm posted, sorted ascending.
    pub post_times: Vec<f64>,
    /// Average feed rank samples, sorted by time.
    pub avg_rank: Vec<SeriesPoint>,
}

/// A broadcast picked for one track of the race.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedBroadcast {
    /// The broadcast's id in the dataset.
    pub id: String,
    /// The broadcast's data.
    pub broadcast: Broadcast,
}

/// The three streams and two metric series that one playback replays.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceData {
    /// Id of the selected wall.
    pub wall_id: String,
    /// Background event times.
    pub wall: Vec<f64>,
    /// First racing algorithm.
    pub first: SelectedBroadcast,
    /// Second racing algorithm.
    pub second: SelectedBroadcast,
}

/// A fully validated dataset, with sources kept in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    walls: Vec<(String, Vec<f64>)>,
    broadcasts: Vec<(String, Broadcast)>,
}

#[derive(Deserialize)]
struct RawDataset {
    walls: Map<String, Value>,
    broadcasts: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawBroadcast {
    post_times: Vec<f64>,
    performance: RawPerformance,
}

#[derive(Deserialize)]
struct RawPerformance {
    avg_rank: Vec<(f64, f64)>,
}

impl Dataset {
    /// Load and validate a dataset from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] if the file cannot be read, or any
    /// error [`Dataset::parse`] can return.
    pub fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate a dataset from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Json`] if a required key is missing or has
    /// the wrong shape, and [`DatasetError::NonFinite`],
    /// [`DatasetError::Unsorted`], or [`DatasetError::DuplicateSampleTime`]
    /// if a stream fails validation.
    pub fn parse(json: &str) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_str(json)?;

        let mut walls = Vec::with_capacity(raw.walls.len());
        for (id, value) in raw.walls {
            let times: Vec<f64> = serde_json::from_value(value)?;
            validate_times(&format!("walls.{id}"), &times)?;
            walls.push((id, times));
        }

        let mut broadcasts = Vec::with_capacity(raw.broadcasts.len());
        for (id, value) in raw.broadcasts {
            let raw_broadcast: RawBroadcast = serde_json::from_value(value)?;
            validate_times(&format!("broadcasts.{id}.post_times"), &raw_broadcast.post_times)?;
            let avg_rank: Vec<SeriesPoint> = raw_broadcast
                .performance
                .avg_rank
                .into_iter()
                .map(SeriesPoint::from)
                .collect();
            validate_series(&format!("broadcasts.{id}.performance.avg_rank"), &avg_rank)?;
            broadcasts.push((
                id,
                Broadcast {
                    post_times: raw_broadcast.post_times,
                    avg_rank,
                },
            ));
        }

        debug!(
            walls = walls.len(),
            broadcasts = broadcasts.len(),
            "Dataset parsed"
        );
        Ok(Self { walls, broadcasts })
    }

    /// Wall ids in document order.
    pub fn wall_ids(&self) -> impl Iterator<Item = &str> {
        self.walls.iter().map(|(id, _)| id.as_str())
    }

    /// Broadcast ids in document order.
    pub fn broadcast_ids(&self) -> impl Iterator<Item = &str> {
        self.broadcasts.iter().map(|(id, _)| id.as_str())
    }

    /// Look up a wall by id.
    pub fn wall(&self, id: &str) -> Option<&[f64]> {
        self.walls
            .iter()
            .find(|(wall_id, _)| wall_id == id)
            .map(|(_, times)| times.as_slice())
    }

    /// Look up a broadcast by id.
    pub fn broadcast(&self, id: &str) -> Option<&Broadcast> {
        self.broadcasts
            .iter()
            .find(|(broadcast_id, _)| broadcast_id == id)
            .map(|(_, broadcast)| broadcast)
    }

    /// Pick the wall and the two broadcasts to race.
    ///
    /// Without explicit ids in `data`, the first wall and the first two
    /// broadcasts in document order are used.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::NoWalls`] or
    /// [`DatasetError::NotEnoughBroadcasts`] when defaults cannot be
    /// filled, and [`DatasetError::UnknownWall`] or
    /// [`DatasetError::UnknownBroadcast`] when a configured id is absent.
    pub fn select(&self, data: &DataConfig) -> Result<RaceData, DatasetError> {
        let (wall_id, wall) = match &data.wall_id {
            Some(id) => {
                let times = self
                    .wall(id)
                    .ok_or_else(|| DatasetError::UnknownWall { id: id.clone() })?;
                (id.clone(), times.to_vec())
            }
            None => {
                let (id, times) = self.walls.first().ok_or(DatasetError::NoWalls)?;
                (id.clone(), times.clone())
            }
        };

        let (first, second) = match &data.broadcast_ids {
            Some([first_id, second_id]) => (
                self.select_broadcast(first_id)?,
                self.select_broadcast(second_id)?,
            ),
            None => {
                let mut defaults = self.broadcasts.iter();
                match (defaults.next(), defaults.next()) {
                    (Some((first_id, first)), Some((second_id, second))) => (
                        SelectedBroadcast {
                            id: first_id.clone(),
                            broadcast: first.clone(),
                        },
                        SelectedBroadcast {
                            id: second_id.clone(),
                            broadcast: second.clone(),
                        },
                    ),
                    _ => {
                        return Err(DatasetError::NotEnoughBroadcasts {
                            found: self.broadcasts.len(),
                        });
                    }
                }
            }
        };

        Ok(RaceData {
            wall_id,
            wall,
            first,
            second,
        })
    }

    fn select_broadcast(&self, id: &str) -> Result<SelectedBroadcast, DatasetError> {
        let broadcast = self
            .broadcast(id)
            .ok_or_else(|| DatasetError::UnknownBroadcast { id: id.to_owned() })?;
        Ok(SelectedBroadcast {
            id: id.to_owned(),
            broadcast: broadcast.clone(),
        })
    }
}

/// Reject non-finite or decreasing timestamps. Repeats are allowed.
fn validate_times(stream: &str, times: &[f64]) -> Result<(), DatasetError> {
    let mut previous = f64::NEG_INFINITY;
    for (index, &time) in times.iter().enumerate() {
        if !time.is_finite() {
            return Err(DatasetError::NonFinite {
                stream: stream.to_owned(),
                index,
            });
        }
        if time < previous {
            return Err(DatasetError::Unsorted {
                stream: stream.to_owned(),
                index,
            });
        }
        previous = time;
    }
    Ok(())
}

fn validate_series(stream: &str, points: &[SeriesPoint]) -> Result<(), DatasetError> {
    if let Some(index) = points.iter().position(|p| !p.value.is_finite()) {
        return Err(DatasetError::NonFinite {
            stream: stream.to_owned(),
            index,
        });
    }
    let times: Vec<f64> = points.iter().map(|p| p.time).collect();
    validate_times(stream, &times)?;
    // Each sample becomes a step edge, so two samples at one time would
    // send the plotted sequence backwards.
    if let Some(index) = times.windows(2).position(|pair| matches!(pair, [a, b] if a >= b)) {
        return Err(DatasetError::DuplicateSampleTime {
            stream: stream.to_owned(),
            index: index.saturating_add(1),
        });
    }
    Ok(())
}
