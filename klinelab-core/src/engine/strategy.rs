//! Strategy trait and the per-bar context handed to it.

use super::broker::Broker;
use crate::domain::{Bar, Order, OrderId, OrderSide, Position};

/// Bar-by-bar trading logic.
///
/// `prenext` receives warm-up bars (those before the feed's start date),
/// `next` receives live bars. Orders placed from either fill at the next
/// bar's open.
pub trait Strategy: Send {
    fn prenext(&mut self, _ctx: &mut StrategyContext<'_>) {}

    fn next(&mut self, ctx: &mut StrategyContext<'_>);

    /// Called when an order completes, is rejected, or expires.
    fn notify_order(&mut self, _order: &Order) {}
}

/// View of the feed and broker at one bar.
pub struct StrategyContext<'a> {
    bars: &'a [Bar],
    index: usize,
    broker: &'a mut Broker,
}

impl<'a> StrategyContext<'a> {
    pub(crate) fn new(bars: &'a [Bar], index: usize, broker: &'a mut Broker) -> Self {
        Self {
            bars,
            index,
            broker,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// History up to and including the current bar.
    pub fn bars(&self) -> &[Bar] {
        &self.bars[..=self.index]
    }

    pub fn bar(&self) -> &Bar {
        &self.bars[self.index]
    }

    pub fn cash(&self) -> f64 {
        self.broker.cash()
    }

    pub fn position(&self) -> &Position {
        self.broker.position()
    }

    /// Portfolio value marked at the current close.
    pub fn value(&self) -> f64 {
        self.broker.value(self.bar().close)
    }

    pub fn buy(&mut self, size: f64) -> OrderId {
        self.broker.submit(OrderSide::Buy, size, self.index)
    }

    pub fn sell(&mut self, size: f64) -> OrderId {
        self.broker.submit(OrderSide::Sell, size, self.index)
    }

    /// Sell the whole long position. `None` when already flat.
    pub fn close(&mut self) -> Option<OrderId> {
        let size = self.broker.position().size;
        if size > 0.0 {
            Some(self.sell(size))
        } else {
            None
        }
    }
}
