//! Kline provider trait and structured error types.
//!
//! The KlineProvider trait abstracts over exchanges so the monthly downloader
//! can be exercised with a mock in tests.

use super::schema::SchemaError;
use crate::domain::Bar;
use chrono::NaiveDateTime;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
///
/// `NoCsvFiles` is the configuration error of the loader: it is raised
/// immediately and never retried. Parsing and schema failures keep the
/// underlying library error intact.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no CSV files found in folder: {}", folder.display())]
    NoCsvFiles { folder: PathBuf },

    #[error("missing required column '{column}' in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("first column '{column}' of {} is not a timestamp (parsed as {dtype})", path.display())]
    UnparseableTimestamp {
        path: PathBuf,
        column: String,
        dtype: String,
    },

    #[error("null timestamp at row {row}")]
    NullTimestamp { row: usize },

    #[error("timestamp out of range: {0} ms")]
    TimestampOutOfRange(i64),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether a provider call that failed with this error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_) | DataError::RateLimited { .. }
        )
    }
}

/// Source of historical klines (Binance, or a mock in tests).
pub trait KlineProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars with open time in `[start, end)` at the given interval (e.g. "1m").
    fn fetch(
        &self,
        symbol: &str,
        interval: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, DataError>;
}

/// Progress callback for the month-by-month downloader.
pub trait DownloadProgress {
    fn on_skip(&self, file_name: &str);

    fn on_fetch(&self, file_name: &str, index: usize, total: usize);

    fn on_complete(&self, file_name: &str, result: &Result<usize, DataError>);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_skip(&self, file_name: &str) {
        println!("File {file_name} already exists, skipping...");
    }

    fn on_fetch(&self, file_name: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {file_name}...", index + 1, total);
    }

    fn on_complete(&self, file_name: &str, result: &Result<usize, DataError>) {
        match result {
            Ok(0) => println!("  EMPTY: no data returned for {file_name}"),
            Ok(rows) => println!("  OK: {file_name} ({rows} bars)"),
            Err(e) => println!("  FAIL: {file_name}: {e}"),
        }
    }
}
