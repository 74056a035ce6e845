//! klinelab runner: scenario configuration and parameter-grid optimisation.
//!
//! Builds on `klinelab-core`:
//! - TOML scenario files with flexible date parsing
//! - Parallel optimisation of one strategy over a parameter grid

pub mod config;
pub mod optimize;

pub use config::{parse_timestamp, ConfigError, ScenarioConfig};
pub use optimize::{optimize, optimize_feed, OptimizationReport, OptimizationRun, OptimizeError};
