//! Market orders and their lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic order identifier, unique within one broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order lifecycle states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted by the broker, waiting for the next bar's open.
    Submitted,
    /// Completely filled.
    Completed,
    /// Refused by the broker (not enough cash, oversized sell, bad size).
    Rejected { reason: String },
    /// Still pending when the feed ran out of bars.
    Expired,
}

/// A market order. Fills at the open of the bar after submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: OrderSide,
    pub size: f64,
    pub created_bar: usize,
    pub status: OrderStatus,
}

impl Order {
    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == OrderSide::Sell
    }

    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Submitted
    }
}
