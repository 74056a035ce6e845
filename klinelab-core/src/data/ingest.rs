//! Read one monthly price file into a canonical frame.

use super::provider::DataError;
use super::schema::{BarSchema, COLUMN_RENAMES, OHLCV, TIMESTAMP};
use polars::prelude::*;
use std::path::Path;

/// Parse a CSV price file into the canonical `timestamp, open, high, low,
/// close, volume` frame.
///
/// The first column is the timestamp index whatever its header says; date
/// parsing is enabled on read and the column must come out as a date or
/// datetime. Capitalised OHLCV headers are renamed through
/// [`COLUMN_RENAMES`]; lowercase headers are accepted as-is. Any other
/// column is dropped.
pub fn read_price_file(path: &Path) -> Result<DataFrame, DataError> {
    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    canonicalize_frame(raw, path)
}

/// Rename and cast an already-parsed frame to the canonical layout.
///
/// `origin` is only used for error messages.
pub fn canonicalize_frame(mut df: DataFrame, origin: &Path) -> Result<DataFrame, DataError> {
    let index_name = df
        .get_columns()
        .first()
        .map(|c| c.name().to_string())
        .ok_or_else(|| DataError::MissingColumn {
            path: origin.to_path_buf(),
            column: TIMESTAMP.to_string(),
        })?;

    for (from, to) in COLUMN_RENAMES {
        if from != index_name
            && df.get_column_index(from).is_some()
            && df.get_column_index(to).is_none()
        {
            df.rename(from, to.into())?;
        }
    }

    if df.height() == 0 {
        // Header-only file: no rows to type, only the layout to check.
        if let Some(name) = OHLCV.iter().find(|name| df.get_column_index(name).is_none()) {
            return Err(DataError::MissingColumn {
                path: origin.to_path_buf(),
                column: name.to_string(),
            });
        }
        return Ok(DataFrame::empty_with_schema(&BarSchema::schema()));
    }

    let index = df.column(&index_name)?;
    let timestamp = match index.dtype() {
        DataType::Datetime(_, _) | DataType::Date => index
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .with_name(TIMESTAMP.into()),
        other => {
            return Err(DataError::UnparseableTimestamp {
                path: origin.to_path_buf(),
                column: index_name,
                dtype: other.to_string(),
            })
        }
    };

    let mut columns = Vec::with_capacity(OHLCV.len() + 1);
    columns.push(timestamp);
    for name in OHLCV {
        if df.get_column_index(name).is_none() {
            return Err(DataError::MissingColumn {
                path: origin.to_path_buf(),
                column: name.to_string(),
            });
        }
        let values = df
            .column(name)?
            .as_materialized_series()
            .strict_cast(&DataType::Float64)?;
        columns.push(values.into_column());
    }

    Ok(DataFrame::new(columns)?)
}
