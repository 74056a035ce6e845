//! Serializable scenario configuration.

use chrono::{NaiveDate, NaiveDateTime};
use klinelab_core::scenario::{ScenarioParams, DEFAULT_COMMISSION_RATE, DEFAULT_INITIAL_CASH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid timestamp '{value}' for {field}: expected YYYY-MM-DD[ HH:MM[:SS]]")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// One scenario as written in a TOML file.
///
/// ```toml
/// folder = "downloaded_coin_data/XRPUSDT_1m"
/// start_date = "2024-12-01"
/// end_date = "2025-01-31 23:59"
/// warmup_bars = 600
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub folder: PathBuf,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub warmup_bars: usize,
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
}

fn default_initial_cash() -> f64 {
    DEFAULT_INITIAL_CASH
}

fn default_commission_rate() -> f64 {
    DEFAULT_COMMISSION_RATE
}

impl ScenarioConfig {
    /// Read a config file. A relative `folder` is resolved against the
    /// directory holding the file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if config.folder.is_relative() {
            if let Some(dir) = path.parent() {
                config.folder = dir.join(&config.folder);
            }
        }
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse the dates and produce builder parameters.
    pub fn params(&self) -> Result<ScenarioParams, ConfigError> {
        let start_date = parse_timestamp("start_date", &self.start_date)?;
        let end_date = self
            .end_date
            .as_deref()
            .map(|s| parse_timestamp("end_date", s))
            .transpose()?;

        Ok(ScenarioParams {
            start_date,
            end_date,
            warmup_bars: self.warmup_bars,
            initial_cash: self.initial_cash,
            commission_rate: self.commission_rate,
        })
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse `YYYY-MM-DD` (midnight) or a date with `HH:MM[:SS]` after a space or `T`.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, ConfigError> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ConfigError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}
