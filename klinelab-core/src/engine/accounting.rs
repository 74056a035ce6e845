use crate::domain::{Fill, OrderSide};

/// Cash, realized PnL and equity history of one broker.
#[derive(Debug, Clone)]
pub struct EquityTracker {
    initial_cash: f64,
    cash: f64,
    realized_pnl: f64,
    commission_paid: f64,
    equity_history: Vec<f64>,
}

impl EquityTracker {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            realized_pnl: 0.0,
            commission_paid: 0.0,
            equity_history: Vec::new(),
        }
    }

    /// Apply a fill to cash and realized PnL.
    ///
    /// `avg_entry_price` is the position's average price before the fill.
    pub fn apply_fill(&mut self, fill: &Fill, avg_entry_price: f64) {
        match fill.side {
            OrderSide::Buy => {
                self.cash -= fill.notional();
            }
            OrderSide::Sell => {
                self.cash += fill.notional();
                self.realized_pnl += (fill.price - avg_entry_price) * fill.size;
            }
        }

        self.cash -= fill.commission;
        self.commission_paid += fill.commission;
    }

    /// Record equity at bar close
    pub fn record_equity(&mut self, equity: f64) {
        self.equity_history.push(equity);
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn commission_paid(&self) -> f64 {
        self.commission_paid
    }

    pub fn total_pnl(&self, current_equity: f64) -> f64 {
        current_equity - self.initial_cash
    }

    pub fn equity_history(&self) -> &[f64] {
        &self.equity_history
    }
}
