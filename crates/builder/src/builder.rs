//! Candle series construction.
//!
//! Observations are sorted by timestamp (stable, so same-second trades keep
//! their input order), grouped into half-open intervals `[start, start + width)`
//! and folded into candles. Intervals without trades that lie between two
//! traded intervals become flat synthetic candles carrying the previous close.

use crate::accumulator::Accumulator;
use crate::error::BuildError;
use crate::validation::validate_batch;
use candle_replay_domain::{Candle, CandleInterval, PriceObservation, VolumeRule};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Builds a contiguous candle series covering exactly the observed span.
///
/// # Arguments
/// * `observations` - Swap price observations in any order
/// * `interval` - Candle width
/// * `rule` - How the volume column is aggregated
///
/// # Returns
/// Candles in strictly increasing `open_time`, one per interval from the
/// interval of the earliest observation to that of the latest. Empty input
/// yields an empty series.
///
/// # Errors
/// Returns [`BuildError::InvalidObservation`] if any observation is invalid,
/// or [`BuildError::TimestampOutOfRange`] if an interval start cannot be
/// represented.
pub fn build_candles(
    observations: &[PriceObservation],
    interval: CandleInterval,
    rule: VolumeRule,
) -> Result<Vec<Candle>, BuildError> {
    assemble(observations, interval, rule, None)
}

/// Builds exactly `target_count` candles starting at the earliest observation.
///
/// The data-driven series is truncated to the first `target_count` intervals,
/// or padded with synthetic candles carrying the last close when real
/// activity ends earlier. Empty input still yields an empty series.
///
/// # Errors
/// Same as [`build_candles`].
pub fn build_candles_bounded(
    observations: &[PriceObservation],
    interval: CandleInterval,
    rule: VolumeRule,
    target_count: usize,
) -> Result<Vec<Candle>, BuildError> {
    let mut candles = assemble(observations, interval, rule, Some(target_count))?;
    if candles.is_empty() || candles.len() >= target_count {
        return Ok(candles);
    }

    let (mut start, price) = match candles.last() {
        Some(last) => (
            next_start(last.open_time().timestamp(), interval)?,
            last.close(),
        ),
        None => return Ok(candles),
    };
    debug!(
        real = candles.len(),
        padded = target_count - candles.len(),
        "Padding bounded series"
    );
    while candles.len() < target_count {
        candles.push(Candle::synthetic(open_time(start)?, price));
        start = next_start(start, interval)?;
    }
    Ok(candles)
}

fn assemble(
    observations: &[PriceObservation],
    interval: CandleInterval,
    rule: VolumeRule,
    limit: Option<usize>,
) -> Result<Vec<Candle>, BuildError> {
    validate_batch(observations)?;
    if observations.is_empty() || limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut sorted: Vec<&PriceObservation> = observations.iter().collect();
    sorted.sort_by_key(|obs| obs.timestamp);

    let capacity = limit.unwrap_or(sorted.len()).min(sorted.len().max(1) * 2);
    let mut candles = Vec::with_capacity(capacity);
    let mut current: Option<Accumulator> = None;
    let full = |candles: &[Candle]| limit.is_some_and(|n| candles.len() >= n);

    for obs in sorted {
        let start = interval
            .align(obs.timestamp)
            .ok_or(BuildError::TimestampOutOfRange(obs.timestamp))?;
        match current.as_mut() {
            Some(acc) if acc.start == start => acc.push(obs),
            Some(acc) => {
                let (prev_start, prev_close) = (acc.start, acc.close);
                candles.push(finish(acc)?);
                if full(&candles) {
                    return Ok(candles);
                }

                let mut gap = next_start(prev_start, interval)?;
                while gap < start {
                    candles.push(Candle::synthetic(open_time(gap)?, prev_close));
                    if full(&candles) {
                        return Ok(candles);
                    }
                    gap = next_start(gap, interval)?;
                }
                current = Some(Accumulator::open(start, obs, rule));
            }
            None => current = Some(Accumulator::open(start, obs, rule)),
        }
    }

    if let Some(acc) = current.as_ref() {
        candles.push(finish(acc)?);
    }
    Ok(candles)
}

fn finish(acc: &Accumulator) -> Result<Candle, BuildError> {
    Ok(Candle::new(
        open_time(acc.start)?,
        acc.open,
        acc.high,
        acc.low,
        acc.close,
        acc.volume,
        acc.trades,
    ))
}

fn open_time(start: i64) -> Result<DateTime<Utc>, BuildError> {
    DateTime::from_timestamp(start, 0).ok_or(BuildError::TimestampOutOfRange(start))
}

fn next_start(start: i64, interval: CandleInterval) -> Result<i64, BuildError> {
    start
        .checked_add(interval.as_secs_i64())
        .ok_or(BuildError::TimestampOutOfRange(start))
}

/// Candle builder configuration.
///
/// Wraps the interval, the volume rule and an optional fixed candle count so
/// callers can configure once and build many batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleBuilder {
    /// Candle width.
    pub interval: CandleInterval,
    /// Volume aggregation rule.
    pub volume_rule: VolumeRule,
    /// Fixed number of candles; `None` covers the observed span.
    pub target_count: Option<usize>,
}

impl CandleBuilder {
    /// Creates an unbounded builder counting trades as volume.
    #[must_use]
    pub fn new(interval: CandleInterval) -> Self {
        Self {
            interval,
            volume_rule: VolumeRule::default(),
            target_count: None,
        }
    }

    /// Sets the volume rule.
    #[must_use]
    pub fn with_volume_rule(mut self, rule: VolumeRule) -> Self {
        self.volume_rule = rule;
        self
    }

    /// Switches to bounded mode with exactly `target_count` candles.
    #[must_use]
    pub fn bounded(mut self, target_count: usize) -> Self {
        self.target_count = Some(target_count);
        self
    }

    /// Switches back to data-driven mode.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.target_count = None;
        self
    }

    /// Builds candles for a batch of observations.
    ///
    /// # Errors
    /// See [`build_candles`].
    pub fn build(&self, observations: &[PriceObservation]) -> Result<Vec<Candle>, BuildError> {
        match self.target_count {
            Some(n) => build_candles_bounded(observations, self.interval, self.volume_rule, n),
            None => build_candles(observations, self.interval, self.volume_rule),
        }
    }
}

impl Default for CandleBuilder {
    fn default() -> Self {
        Self::new(CandleInterval::default())
    }
}
