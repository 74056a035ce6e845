//! Data ingestion: monthly kline CSVs in, sorted price series out.

pub mod binance;
pub mod discover;
pub mod download;
pub mod ingest;
pub mod monthly;
pub mod provider;
pub mod schema;
pub mod series;
pub mod synthetic;
pub mod window;

pub use binance::BinanceProvider;
pub use discover::find_csv_files;
pub use download::{download_monthly, DownloadRequest, DownloadSummary};
pub use ingest::read_price_file;
pub use provider::{DataError, DownloadProgress, KlineProvider, StdoutProgress};
pub use schema::{BarSchema, SchemaError};
pub use series::{fingerprint, PriceSeries};
pub use window::{search_left, search_right, DateWindow, SliceBounds};
