use serde::{Deserialize, Serialize};

/// Position tracking for the single traded pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub size: f64,
    pub avg_entry_price: f64,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.size == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.size > 0.0
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.size * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.size * (current_price - self.avg_entry_price)
    }
}
