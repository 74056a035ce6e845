//! Synthetic minute klines for tests and offline demos.
//!
//! Produces a deterministic random walk seeded from a label, so the same
//! label always yields the same bars. These are clearly fake prices.

use super::monthly::{monthly_file_name, write_monthly_csv};
use super::provider::DataError;
use crate::domain::Bar;
use chrono::{Datelike, Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Generate `count` one-minute bars starting at `start`.
pub fn generate_minute_bars(label: &str, start: NaiveDateTime, count: usize) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(count);
    let mut price = 0.5_f64;

    for i in 0..count {
        let minute_return: f64 = rng.gen_range(-0.002..0.002);
        let open = price;
        let close = price * (1.0 + minute_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.001));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.001));
        let volume = rng.gen_range(1_000.0..50_000.0_f64).round();

        bars.push(Bar {
            timestamp: start + Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }

    bars
}

/// Split bars by calendar month and write each month as `YYYY_MM.csv`.
///
/// Returns the written paths in month order.
pub fn write_synthetic_months(folder: &Path, bars: &[Bar]) -> Result<Vec<PathBuf>, DataError> {
    std::fs::create_dir_all(folder)?;

    let mut by_month: BTreeMap<(i32, u32), Vec<Bar>> = BTreeMap::new();
    for bar in bars {
        by_month
            .entry((bar.timestamp.year(), bar.timestamp.month()))
            .or_default()
            .push(bar.clone());
    }

    let mut written = Vec::with_capacity(by_month.len());
    for month_bars in by_month.values() {
        let path = folder.join(monthly_file_name(month_bars[0].timestamp));
        write_monthly_csv(&path, month_bars)?;
        written.push(path);
    }
    Ok(written)
}
