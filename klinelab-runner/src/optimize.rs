//! Parameter-grid optimisation over one scenario.
//!
//! The slice is loaded once; each grid point gets a fresh engine over a
//! clone of it, and the runs execute in parallel on the rayon pool.

use crate::config::{ConfigError, ScenarioConfig};
use klinelab_core::scenario::{engine_from_feed, load_slice, ScenarioError, ScenarioParams};
use klinelab_core::{DataFeed, EngineError, RunResult, Strategy};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("parameter grid is empty")]
    EmptyGrid,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One grid point and the run it produced.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationRun<P> {
    pub params: P,
    pub result: RunResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport<P> {
    /// Runs in grid order.
    pub runs: Vec<OptimizationRun<P>>,
    /// Index into `runs` of the highest final portfolio value.
    pub best: usize,
}

impl<P> OptimizationReport<P> {
    pub fn best(&self) -> &OptimizationRun<P> {
        &self.runs[self.best]
    }
}

/// Load the configured slice and run one strategy per grid point.
pub fn optimize<P, F>(
    config: &ScenarioConfig,
    grid: &[P],
    factory: F,
) -> Result<OptimizationReport<P>, OptimizeError>
where
    P: Clone + Send + Sync,
    F: Fn(&P) -> Box<dyn Strategy> + Sync,
{
    if grid.is_empty() {
        return Err(OptimizeError::EmptyGrid);
    }
    let params = config.params()?;
    params.validate()?;
    let feed = load_slice(&config.folder, &params)?;
    optimize_feed(&feed, &params, grid, factory)
}

/// Run one strategy per grid point over an already loaded feed.
pub fn optimize_feed<P, F>(
    feed: &DataFeed,
    params: &ScenarioParams,
    grid: &[P],
    factory: F,
) -> Result<OptimizationReport<P>, OptimizeError>
where
    P: Clone + Send + Sync,
    F: Fn(&P) -> Box<dyn Strategy> + Sync,
{
    if grid.is_empty() {
        return Err(OptimizeError::EmptyGrid);
    }

    let runs = grid
        .par_iter()
        .map(|point| -> Result<OptimizationRun<P>, OptimizeError> {
            let mut engine = engine_from_feed(feed.clone(), params)?;
            engine.add_strategy(factory(point));
            let result = engine.run()?;
            Ok(OptimizationRun {
                params: point.clone(),
                result,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let best = best_index(&runs);
    info!(
        runs = runs.len(),
        best,
        final_value = runs[best].result.final_value,
        "optimisation finished"
    );
    Ok(OptimizationReport { runs, best })
}

/// Highest final value; ties keep the earliest grid point, NaN never wins.
fn best_index<P>(runs: &[OptimizationRun<P>]) -> usize {
    let mut best = 0;
    for (i, run) in runs.iter().enumerate().skip(1) {
        let current = runs[best].result.final_value;
        let candidate = run.result.final_value;
        if candidate > current || (current.is_nan() && !candidate.is_nan()) {
            best = i;
        }
    }
    best
}
