use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One fixed-width OHLCV interval, either aggregated from trades or
/// synthesized to bridge an interval without any.
///
/// Candles are built once and never mutated; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    open_time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    trades: u32,
}

impl Candle {
    /// Creates a candle from aggregated values.
    #[must_use]
    pub fn new(
        open_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        trades: u32,
    ) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            trades,
        }
    }

    /// Creates a flat candle carrying `price` forward with zero volume.
    #[must_use]
    pub fn synthetic(open_time: DateTime<Utc>, price: f64) -> Self {
        Self::new(open_time, price, price, price, price, 0.0, 0)
    }

    pub fn open_time(&self) -> DateTime<Utc> {
        self.open_time
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Number of real trades aggregated into this candle.
    pub fn trades(&self) -> u32 {
        self.trades
    }

    /// True when no trade fell into this interval.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.trades == 0
    }

    /// Flattens the candle into a row for tabular export.
    #[must_use]
    pub fn to_record(&self) -> CandleRecord {
        CandleRecord {
            open_time: self.open_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Flat row representation of a [`Candle`], column order matching the CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleRecord {
    /// Interval start, RFC 3339 in UTC.
    pub open_time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}
