//! Scenario builder: from a folder of monthly kline CSVs to a ready engine.
//!
//! [`build_engine`] reads every `*.csv` in the folder, sorts the combined
//! bars, cuts the requested date window (plus warm-up bars before the start),
//! and returns a fresh [`Engine`] with that slice attached and the broker
//! configured. Nothing is cached between calls.

use crate::data::{DataError, DateWindow, PriceSeries};
use crate::engine::Engine;
use crate::feed::DataFeed;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_INITIAL_CASH: f64 = 100.0;
pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("invalid scenario parameters: {0}")]
    InvalidParams(String),
}

/// Date window and broker settings of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub warmup_bars: usize,
    pub initial_cash: f64,
    pub commission_rate: f64,
}

impl ScenarioParams {
    /// Parameters starting at `start_date` with no end, no warm-up and the
    /// default cash and commission.
    pub fn new(start_date: NaiveDateTime) -> Self {
        Self {
            start_date,
            end_date: None,
            warmup_bars: 0,
            initial_cash: DEFAULT_INITIAL_CASH,
            commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDateTime) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_warmup_bars(mut self, warmup_bars: usize) -> Self {
        self.warmup_bars = warmup_bars;
        self
    }

    pub fn with_initial_cash(mut self, initial_cash: f64) -> Self {
        self.initial_cash = initial_cash;
        self
    }

    pub fn with_commission_rate(mut self, commission_rate: f64) -> Self {
        self.commission_rate = commission_rate;
        self
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date, self.warmup_bars)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(ScenarioError::InvalidParams(format!(
                "initial_cash must be a positive number, got {}",
                self.initial_cash
            )));
        }
        if !self.commission_rate.is_finite() || self.commission_rate < 0.0 {
            return Err(ScenarioError::InvalidParams(format!(
                "commission_rate must be a non-negative number, got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

/// Load the folder and build an engine over the requested window.
pub fn build_engine(folder: &Path, params: &ScenarioParams) -> Result<Engine, ScenarioError> {
    params.validate()?;
    let feed = load_slice(folder, params)?;
    engine_from_feed(feed, params)
}

/// Load the folder and copy out the requested window as a feed.
pub fn load_slice(folder: &Path, params: &ScenarioParams) -> Result<DataFeed, ScenarioError> {
    let series = PriceSeries::load(folder)?;
    let window = params.window();
    let bounds = window.resolve(series.timestamps());
    let bars = series.slice(bounds)?;

    info!(
        folder = %folder.display(),
        files = series.files().len(),
        series_len = series.len(),
        warmup_start = bounds.warmup_start,
        start = bounds.start,
        end = bounds.end,
        warmup = bounds.warmup_len(),
        "resolved date window"
    );

    Ok(DataFeed::new(feed_name(folder), bars, &window, bounds.warmup_len()))
}

/// A fresh engine with `feed` attached and the broker configured from `params`.
pub fn engine_from_feed(feed: DataFeed, params: &ScenarioParams) -> Result<Engine, ScenarioError> {
    params.validate()?;
    let mut engine = Engine::new();
    engine.add_feed(feed);
    engine.broker_mut().set_cash(params.initial_cash);
    engine.broker_mut().set_commission(params.commission_rate);
    Ok(engine)
}

fn feed_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.display().to_string())
}
