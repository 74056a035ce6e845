use crate::domain::{Fill, Order};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Result of a complete backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub feed_name: String,
    pub starting_cash: f64,
    pub final_cash: f64,
    /// Cash plus the position marked at the last valid close.
    pub final_value: f64,
    /// Portfolio value at each bar close, warm-up bars included.
    pub equity_curve: Vec<f64>,
    pub fills: Vec<Fill>,
    /// Every order submitted, with its final status.
    pub orders: Vec<Order>,
    pub realized_pnl: f64,
    pub commission_paid: f64,
    /// Total number of bars processed.
    pub bars_processed: usize,
    /// Number of bars routed to `prenext`.
    pub warmup_bars: usize,
    pub first_bar: Option<NaiveDateTime>,
    pub last_bar: Option<NaiveDateTime>,
}

impl RunResult {
    pub fn total_pnl(&self) -> f64 {
        self.final_value - self.starting_cash
    }

    pub fn total_return(&self) -> f64 {
        if self.starting_cash == 0.0 {
            0.0
        } else {
            self.total_pnl() / self.starting_cash
        }
    }
}
