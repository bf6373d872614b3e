//! CSV export of candle series.
//!
//! Columns are `open_time,open,high,low,close,volume`, one row per candle in
//! the order given, with `open_time` in RFC 3339 UTC.

use crate::error::DataError;
use candle_replay_domain::Candle;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes candles as CSV into any writer.
///
/// # Errors
/// Returns an error if serialization or the underlying writer fails.
pub fn write_csv<W: Write>(writer: W, candles: &[Candle]) -> Result<(), DataError> {
    let mut csv = csv::Writer::from_writer(writer);
    if candles.is_empty() {
        csv.write_record(["open_time", "open", "high", "low", "close", "volume"])?;
    }
    for candle in candles {
        csv.serialize(candle.to_record())?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes candles to a CSV file, replacing it if present.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn export_csv(path: impl AsRef<Path>, candles: &[Candle]) -> Result<(), DataError> {
    let path = path.as_ref();
    write_csv(File::create(path)?, candles)?;
    info!(path = %path.display(), rows = candles.len(), "Candles exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn candle(ts: i64, price: f64) -> Candle {
        Candle::new(DateTime::from_timestamp(ts, 0).unwrap(), price, price * 1.5, price / 2.0, price, 2.0, 2)
    }

    #[test]
    fn test_write_csv() {
        let candles = vec![candle(60, 1.0), Candle::synthetic(DateTime::from_timestamp(120, 0).unwrap(), 1.0)];
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &candles).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "open_time,open,high,low,close,volume");
        assert_eq!(lines[1], "1970-01-01T00:01:00Z,1.0,1.5,0.5,1.0,2.0");
        assert_eq!(lines[2], "1970-01-01T00:02:00Z,1.0,1.0,1.0,1.0,0.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_series_still_has_header() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "open_time,open,high,low,close,volume\n");
    }

    #[test]
    fn test_export_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candles.csv");
        export_csv(&path, &[candle(0, 2.0)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("open_time,open,high,low,close,volume\n1970-01-01T00:00:00Z,2.0,3.0,1.0,2.0,2.0"));
    }
}
