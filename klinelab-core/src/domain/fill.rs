use crate::domain::order::{OrderId, OrderSide};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fill record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub side: OrderSide,
    pub price: f64,
    pub size: f64,
    pub commission: f64,
}

impl Fill {
    /// Cash value of the fill before commission.
    pub fn notional(&self) -> f64 {
        self.price * self.size
    }
}
