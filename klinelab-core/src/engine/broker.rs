//! Broker: cash, the single long position, and the market-order book.
//!
//! Orders submitted while bar `i` is processed fill at the open of bar
//! `i + 1`. Buys that cannot be covered by cash (including commission) and
//! sells larger than the open position are rejected at fill time.

use super::accounting::EquityTracker;
use super::commission::CommissionInfo;
use crate::domain::{Bar, Fill, Order, OrderId, OrderSide, OrderStatus, Position};
use tracing::debug;

/// Default starting cash when none is configured.
pub const DEFAULT_CASH: f64 = 10_000.0;

/// Slack for float comparisons of cash and position size.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Broker {
    accounts: EquityTracker,
    commission: CommissionInfo,
    position: Position,
    orders: Vec<Order>,
    fills: Vec<Fill>,
    /// Orders rejected at submission, not yet reported to strategies.
    unreported: Vec<Order>,
    next_id: u64,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        Self {
            accounts: EquityTracker::new(DEFAULT_CASH),
            commission: CommissionInfo::frictionless(),
            position: Position::default(),
            orders: Vec::new(),
            fills: Vec::new(),
            unreported: Vec::new(),
            next_id: 1,
        }
    }

    /// Reset the starting cash. Meant for configuration before a run.
    pub fn set_cash(&mut self, cash: f64) {
        self.accounts = EquityTracker::new(cash);
    }

    /// Set the flat commission rate charged on every fill.
    pub fn set_commission(&mut self, rate: f64) {
        self.commission = CommissionInfo::new(rate);
    }

    pub fn cash(&self) -> f64 {
        self.accounts.cash()
    }

    pub fn starting_cash(&self) -> f64 {
        self.accounts.initial_cash()
    }

    pub fn commission(&self) -> CommissionInfo {
        self.commission
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Cash plus the position marked at `price`.
    pub fn value(&self, price: f64) -> f64 {
        self.cash() + self.position.market_value(price)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub(crate) fn accounts(&self) -> &EquityTracker {
        &self.accounts
    }

    pub(crate) fn accounts_mut(&mut self) -> &mut EquityTracker {
        &mut self.accounts
    }

    pub fn has_pending(&self) -> bool {
        self.orders.iter().any(Order::is_active)
    }

    /// Queue a market order. A size that is not a positive finite number is
    /// rejected immediately.
    pub fn submit(&mut self, side: OrderSide, size: f64, bar_index: usize) -> OrderId {
        let id = OrderId(self.next_id);
        self.next_id += 1;

        let status = if size.is_finite() && size > 0.0 {
            OrderStatus::Submitted
        } else {
            OrderStatus::Rejected {
                reason: format!("invalid size {size}"),
            }
        };
        debug!(order = %id, ?side, size, bar_index, "order submitted");
        let order = Order {
            id,
            side,
            size,
            created_bar: bar_index,
            status,
        };
        if !order.is_active() {
            self.unreported.push(order.clone());
        }
        self.orders.push(order);
        id
    }

    /// Orders rejected by `submit` since the last call, in submission order.
    pub(crate) fn take_unreported(&mut self) -> Vec<Order> {
        std::mem::take(&mut self.unreported)
    }

    /// Execute pending orders created before `bar_index` at the bar's open.
    ///
    /// Returns the orders whose status changed, in submission order. A void
    /// bar leaves orders pending until the next tradable open.
    pub(crate) fn process_open(&mut self, bar_index: usize, bar: &Bar) -> Vec<Order> {
        let price = bar.open;
        if price.is_nan() {
            return Vec::new();
        }

        let mut changed = Vec::new();
        for i in 0..self.orders.len() {
            let order = &self.orders[i];
            if !order.is_active() || order.created_bar >= bar_index {
                continue;
            }
            let (side, size) = (order.side, order.size);
            let commission = self.commission.commission(price, size);

            let outcome = match side {
                OrderSide::Buy if price * size + commission > self.cash() + EPSILON => {
                    Err("margin".to_string())
                }
                OrderSide::Sell if size > self.position.size + EPSILON => Err(format!(
                    "sell of {size} exceeds position of {}",
                    self.position.size
                )),
                _ => Ok(()),
            };

            match outcome {
                Ok(()) => {
                    let fill = Fill {
                        order_id: self.orders[i].id,
                        bar_index,
                        timestamp: bar.timestamp,
                        side,
                        price,
                        size,
                        commission,
                    };
                    self.apply_fill(&fill);
                    self.fills.push(fill);
                    self.orders[i].status = OrderStatus::Completed;
                }
                Err(reason) => {
                    debug!(order = %self.orders[i].id, %reason, "order rejected");
                    self.orders[i].status = OrderStatus::Rejected { reason };
                }
            }
            changed.push(self.orders[i].clone());
        }
        changed
    }

    /// Mark every still-pending order as expired. Returns those orders.
    pub(crate) fn expire_pending(&mut self) -> Vec<Order> {
        self.orders
            .iter_mut()
            .filter(|o| o.is_active())
            .map(|o| {
                o.status = OrderStatus::Expired;
                o.clone()
            })
            .collect()
    }

    fn apply_fill(&mut self, fill: &Fill) {
        let avg_before = self.position.avg_entry_price;
        self.accounts.apply_fill(fill, avg_before);

        match fill.side {
            OrderSide::Buy => {
                let new_size = self.position.size + fill.size;
                self.position.avg_entry_price =
                    (self.position.size * avg_before + fill.size * fill.price) / new_size;
                self.position.size = new_size;
            }
            OrderSide::Sell => {
                self.position.size -= fill.size;
                if self.position.size.abs() < EPSILON {
                    self.position = Position::default();
                }
            }
        }
    }
}
