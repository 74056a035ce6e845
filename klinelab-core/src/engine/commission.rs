//! Commission model: a flat percentage of traded notional, charged per side.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CommissionInfo {
    /// Fraction of notional, e.g. `0.001` for 0.1%.
    pub rate: f64,
}

impl CommissionInfo {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0)
    }

    /// `commission = |size| * price * rate`
    pub fn commission(&self, price: f64, size: f64) -> f64 {
        size.abs() * price * self.rate
    }
}
