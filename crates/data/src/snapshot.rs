//! JSON snapshots of collected observations.
//!
//! Collecting observations is the slow, rate-limited part of a run. A
//! snapshot lets the same batch be rebuilt into candles with different
//! intervals or volume rules without touching the network again.

use crate::error::DataError;
use candle_replay_domain::{Pool, PriceObservation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// A collected observation batch together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSnapshot {
    /// Pool the observations were collected from, if known.
    #[serde(default)]
    pub pool: Option<Pool>,
    /// Lower bound used when collecting, Unix seconds.
    pub start_time: i64,
    /// When the snapshot was taken.
    pub collected_at: DateTime<Utc>,
    /// Observations in chronological order.
    pub observations: Vec<PriceObservation>,
}

impl ObservationSnapshot {
    /// Creates a snapshot stamped with the current time.
    #[must_use]
    pub fn new(pool: Option<Pool>, start_time: i64, observations: Vec<PriceObservation>) -> Self {
        Self {
            pool,
            start_time,
            collected_at: Utc::now(),
            observations,
        }
    }
}

/// Saves a snapshot as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &ObservationSnapshot) -> Result<(), DataError> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, snapshot)?;
    info!(
        path = %path.display(),
        observations = snapshot.observations.len(),
        "Snapshot saved"
    );
    Ok(())
}

/// Loads a snapshot.
///
/// # Returns
/// `None` if the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or decoded.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Option<ObservationSnapshot>, DataError> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let snapshot: ObservationSnapshot = serde_json::from_reader(BufReader::new(file))?;
    info!(
        path = %path.display(),
        observations = snapshot.observations.len(),
        "Snapshot loaded"
    );
    Ok(Some(snapshot))
}
