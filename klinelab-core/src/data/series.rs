//! The concatenated, time-sorted price series of one pair folder.

use super::discover::find_csv_files;
use super::ingest::read_price_file;
use super::provider::DataError;
use super::schema::{BarSchema, OHLCV, TIMESTAMP};
use super::window::SliceBounds;
use crate::domain::Bar;
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// All bars of a folder, sorted ascending by timestamp.
///
/// Rows with equal timestamps (overlapping monthly files) are kept; the sort
/// is stable, so they stay in file-name order.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    frame: DataFrame,
    timestamps: Vec<NaiveDateTime>,
    files: Vec<PathBuf>,
}

impl PriceSeries {
    /// Discover, read, concatenate and sort every `*.csv` in `folder`.
    pub fn load(folder: &Path) -> Result<Self, DataError> {
        let files = find_csv_files(folder)?;
        let mut frames = Vec::with_capacity(files.len());
        for path in &files {
            let df = read_price_file(path)?;
            debug!(path = %path.display(), rows = df.height(), "read price file");
            frames.push(df);
        }

        let mut series = Self::from_frames(frames)?;
        series.files = files;
        Ok(series)
    }

    /// Concatenate canonical frames (see [`BarSchema`]) and sort by timestamp.
    pub fn from_frames(frames: Vec<DataFrame>) -> Result<Self, DataError> {
        let mut frames = frames.into_iter();
        let mut combined = match frames.next() {
            Some(first) => first,
            None => DataFrame::empty_with_schema(&BarSchema::schema()),
        };
        for df in frames {
            combined.vstack_mut(&df)?;
        }
        BarSchema::validate(&combined)?;

        let frame = combined.sort(
            [TIMESTAMP],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;
        let timestamps = timestamps_of(&frame)?;

        let duplicates = timestamps.windows(2).filter(|w| w[0] == w[1]).count();
        if duplicates > 0 {
            warn!(duplicates, "price series has repeated timestamps; keeping all rows");
        }

        Ok(Self {
            frame,
            timestamps,
            files: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sorted timestamp index.
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Files the series was loaded from, in read order. Empty for in-memory series.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Copy the rows `[warmup_start, end)` out as owned bars.
    pub fn slice(&self, bounds: SliceBounds) -> Result<Vec<Bar>, DataError> {
        let sliced = self.frame.slice(bounds.warmup_start as i64, bounds.len());
        bars_from_frame(&sliced)
    }

    /// Every bar of the series.
    pub fn bars(&self) -> Result<Vec<Bar>, DataError> {
        bars_from_frame(&self.frame)
    }
}

/// Convert a canonical frame into bars. Null prices become NaN.
pub fn bars_from_frame(frame: &DataFrame) -> Result<Vec<Bar>, DataError> {
    let timestamps = timestamps_of(frame)?;
    let [open, high, low, close, volume] = OHLCV.map(|name| float_column(frame, name));
    let (open, high, low, close, volume) = (open?, high?, low?, close?, volume?);

    Ok(timestamps
        .into_iter()
        .enumerate()
        .map(|(i, timestamp)| Bar {
            timestamp,
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        })
        .collect())
}

fn float_column(frame: &DataFrame, name: &str) -> Result<Vec<f64>, DataError> {
    Ok(frame
        .column(name)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn timestamps_of(frame: &DataFrame) -> Result<Vec<NaiveDateTime>, DataError> {
    let millis = frame.column(TIMESTAMP)?.cast(&DataType::Int64)?;
    millis
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let ms = value.ok_or(DataError::NullTimestamp { row })?;
            DateTime::from_timestamp_millis(ms)
                .map(|dt| dt.naive_utc())
                .ok_or(DataError::TimestampOutOfRange(ms))
        })
        .collect()
}

/// Compute a deterministic BLAKE3 hash over a run of bars.
///
/// Covers timestamps and all OHLCV values in order, so two slices hash
/// equal only if they hold the same bars in the same sequence.
pub fn fingerprint(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp_millis().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(millis: &[i64], closes: &[f64]) -> DataFrame {
        let ts = Series::new(TIMESTAMP.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        df!(
            TIMESTAMP => ts,
            "open" => closes,
            "high" => closes,
            "low" => closes,
            "close" => closes,
            "volume" => vec![1.0; closes.len()],
        )
        .unwrap()
    }

    #[test]
    fn concatenation_is_sorted_by_timestamp() {
        let later = frame(&[180_000, 240_000], &[3.0, 4.0]);
        let earlier = frame(&[60_000, 120_000], &[1.0, 2.0]);

        let series = PriceSeries::from_frames(vec![later, earlier]).unwrap();
        assert_eq!(series.len(), 4);
        assert!(series.timestamps().windows(2).all(|w| w[0] <= w[1]));

        let bars = series.bars().unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn duplicate_timestamps_are_kept_in_file_order() {
        let a = frame(&[60_000, 120_000], &[1.0, 2.0]);
        let b = frame(&[120_000, 180_000], &[20.0, 3.0]);

        let series = PriceSeries::from_frames(vec![a, b]).unwrap();
        assert_eq!(series.len(), 4);
        let closes: Vec<f64> = series.bars().unwrap().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 20.0, 3.0]);
    }

    #[test]
    fn empty_frame_list_gives_empty_series() {
        let series = PriceSeries::from_frames(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.bars().unwrap().is_empty());
    }

    #[test]
    fn slice_copies_requested_rows() {
        let rows = frame(&[0, 60_000, 120_000, 180_000], &[1.0, 2.0, 3.0, 4.0]);
        let series = PriceSeries::from_frames(vec![rows]).unwrap();
        let bars = series
            .slice(SliceBounds {
                warmup_start: 1,
                start: 2,
                end: 3,
            })
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 2.0);
        assert_eq!(bars[1].close, 3.0);
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn non_canonical_frame_is_rejected() {
        let bad = df!("timestamp" => &[1i64], "open" => &[1.0]).unwrap();
        assert!(PriceSeries::from_frames(vec![bad]).is_err());
    }

    #[test]
    fn fingerprint_is_order_sensitive() {
        let series =
            PriceSeries::from_frames(vec![frame(&[0, 60_000], &[1.0, 2.0])]).unwrap();
        let bars = series.bars().unwrap();
        let mut reversed = bars.clone();
        reversed.reverse();

        assert_eq!(fingerprint(&bars), fingerprint(&bars));
        assert_ne!(fingerprint(&bars), fingerprint(&reversed));
    }
}
