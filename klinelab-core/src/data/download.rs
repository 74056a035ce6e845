//! Month-by-month kline download into a pair folder.

use super::monthly::{month_periods, monthly_file_name, write_monthly_csv};
use super::provider::{DataError, DownloadProgress, KlineProvider};
use chrono::NaiveDateTime;
use std::fs;
use std::path::Path;
use tracing::info;

/// What to download and where.
#[derive(Debug, Clone)]
pub struct DownloadRequest<'a> {
    pub symbol: &'a str,
    pub interval: &'a str,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Re-fetch months whose file already exists.
    pub force: bool,
}

/// Download every month of the request into `folder` as `YYYY_MM.csv`.
///
/// Existing files are skipped unless `force` is set. A month the provider
/// returns no bars for is reported and left without a file. Failures are
/// collected per month; a transient failure does not stop later months.
pub fn download_monthly(
    provider: &dyn KlineProvider,
    folder: &Path,
    request: &DownloadRequest<'_>,
    progress: &dyn DownloadProgress,
) -> Result<DownloadSummary, DataError> {
    fs::create_dir_all(folder)?;

    let periods = month_periods(request.start, request.end);
    let total = periods.len();
    let mut summary = DownloadSummary {
        total,
        ..Default::default()
    };

    for (i, (from, to)) in periods.into_iter().enumerate() {
        let file_name = monthly_file_name(from);
        let path = folder.join(&file_name);

        if path.exists() && !request.force {
            progress.on_skip(&file_name);
            summary.skipped += 1;
            continue;
        }

        progress.on_fetch(&file_name, i, total);
        let result = provider
            .fetch(request.symbol, request.interval, from, to)
            .and_then(|bars| {
                if !bars.is_empty() {
                    write_monthly_csv(&path, &bars)?;
                }
                Ok(bars.len())
            });
        progress.on_complete(&file_name, &result);

        match result {
            Ok(0) => summary.empty += 1,
            Ok(_) => summary.written += 1,
            Err(e) => summary.errors.push((file_name, e)),
        }
    }

    info!(
        provider = provider.name(),
        symbol = request.symbol,
        written = summary.written,
        skipped = summary.skipped,
        failed = summary.errors.len(),
        "monthly download finished"
    );
    Ok(summary)
}

/// Summary of a monthly download.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub empty: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}
