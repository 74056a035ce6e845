//! klinelab core: monthly kline data in, configured backtest engine out.
//!
//! - Domain types (bars, orders, fills, position)
//! - CSV discovery, polars ingest, sorted price series, date-window slicing
//! - Data feed and a compact bar-by-bar engine with a long-only broker
//! - Scenario builder tying them together
//! - Binance kline download into monthly CSVs, synthetic data for tests

pub mod data;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod scenario;

pub use engine::{Engine, EngineError, RunResult, Strategy, StrategyContext};
pub use feed::DataFeed;
pub use scenario::{build_engine, engine_from_feed, load_slice, ScenarioError, ScenarioParams};
