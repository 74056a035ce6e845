//! Monthly CSV layout: one `YYYY_MM.csv` per calendar month of klines.
//!
//! Files are written with lowercase headers and a zero `openinterest`
//! column, which [`super::ingest::read_price_file`] reads back directly.

use super::provider::DataError;
use crate::domain::Bar;
use chrono::{Datelike, Months, NaiveDateTime};
use std::fs;
use std::path::Path;

/// Timestamp format of the `datetime` column.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADER: [&str; 7] = [
    "datetime",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "openinterest",
];

/// Consecutive one-month windows `[from, to)` starting at `start`.
///
/// Each window begins on the same day-of-month as `start` (clamped to the
/// month's last day by chrono); the final window is cut at `end`.
pub fn month_periods(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let mut periods = Vec::new();
    let mut current = start;
    while current < end {
        let Some(next) = current.checked_add_months(Months::new(1)) else {
            break;
        };
        periods.push((current, next.min(end)));
        current = next;
    }
    periods
}

/// File name for the month a period starts in, e.g. `2024_12.csv`.
pub fn monthly_file_name(period_start: NaiveDateTime) -> String {
    format!("{}_{:02}.csv", period_start.year(), period_start.month())
}

/// Write bars as a monthly CSV.
///
/// Writes are atomic: the file is written to `<name>.csv.tmp` and renamed
/// into place, so a half-written month never matches `*.csv`.
pub fn write_monthly_csv(path: &Path, bars: &[Bar]) -> Result<(), DataError> {
    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp_path)?;
        writer.write_record(HEADER)?;
        for bar in bars {
            writer.write_record([
                bar.timestamp.format(DATETIME_FORMAT).to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
                "0".to_string(),
            ])?;
        }
        writer.flush()?;
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::Io(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ingest::read_price_file;
    use crate::data::series::bars_from_frame;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn periods_cover_range_and_clip_last() {
        let periods = month_periods(dt(2024, 11, 15, 0, 0), dt(2025, 2, 1, 0, 0));
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0], (dt(2024, 11, 15, 0, 0), dt(2024, 12, 15, 0, 0)));
        assert_eq!(periods[1], (dt(2024, 12, 15, 0, 0), dt(2025, 1, 15, 0, 0)));
        assert_eq!(periods[2], (dt(2025, 1, 15, 0, 0), dt(2025, 2, 1, 0, 0)));
    }

    #[test]
    fn empty_range_has_no_periods() {
        let at = dt(2024, 1, 1, 0, 0);
        assert!(month_periods(at, at).is_empty());
    }

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(monthly_file_name(dt(2024, 3, 9, 12, 0)), "2024_03.csv");
        assert_eq!(monthly_file_name(dt(2024, 12, 1, 0, 0)), "2024_12.csv");
    }

    #[test]
    fn written_file_reads_back_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2021_01.csv");
        let bars = vec![
            Bar {
                timestamp: dt(2021, 1, 1, 0, 0),
                open: 0.2201,
                high: 0.2230,
                low: 0.2190,
                close: 0.2222,
                volume: 1500.5,
            },
            Bar {
                timestamp: dt(2021, 1, 1, 0, 1),
                open: 0.2222,
                high: 0.2240,
                low: 0.2210,
                close: 0.2235,
                volume: 900.0,
            },
        ];

        write_monthly_csv(&path, &bars).unwrap();
        assert!(!dir.path().join("2021_01.csv.tmp").exists());

        let df = read_price_file(&path).unwrap();
        let back = bars_from_frame(&df).unwrap();
        assert_eq!(back, bars);
    }
}
