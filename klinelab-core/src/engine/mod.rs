//! Backtest engine: one feed, one broker, bar-by-bar strategy calls.
//!
//! Per bar:
//! 1. Fill orders pending from earlier bars at this bar's open
//! 2. Notify strategies of every order whose status changed
//! 3. Call `prenext` (warm-up bar) or `next` (live bar) on each strategy,
//!    then report orders the broker refused at submission
//! 4. Record portfolio value at the close
//!
//! Orders still pending after the last bar expire.

pub mod accounting;
pub mod broker;
pub mod commission;
pub mod result;
pub mod strategy;

pub use accounting::EquityTracker;
pub use broker::{Broker, DEFAULT_CASH};
pub use commission::CommissionInfo;
pub use result::RunResult;
pub use strategy::{Strategy, StrategyContext};

use crate::domain::Order;
use crate::feed::DataFeed;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no data feed attached to the engine")]
    NoFeed,

    #[error("engine supports a single data feed, {0} attached")]
    MultipleFeeds(usize),
}

/// A configured backtest, created fresh for each run.
#[derive(Default)]
pub struct Engine {
    feeds: Vec<DataFeed>,
    strategies: Vec<Box<dyn Strategy>>,
    broker: Broker,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feed(&mut self, feed: DataFeed) {
        self.feeds.push(feed);
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut Broker {
        &mut self.broker
    }

    /// The first attached feed.
    pub fn feed(&self) -> Option<&DataFeed> {
        self.feeds.first()
    }

    pub fn feeds(&self) -> &[DataFeed] {
        &self.feeds
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Run every bar of the single attached feed.
    pub fn run(self) -> Result<RunResult, EngineError> {
        let Engine {
            mut feeds,
            mut strategies,
            mut broker,
        } = self;

        let feed = match feeds.len() {
            0 => return Err(EngineError::NoFeed),
            1 => feeds.remove(0),
            n => return Err(EngineError::MultipleFeeds(n)),
        };
        let bars = feed.bars();
        let mut last_close = f64::NAN;

        for (i, bar) in bars.iter().enumerate() {
            let changed = broker.process_open(i, bar);
            notify(&mut strategies, &changed);

            for s in 0..strategies.len() {
                let mut ctx = StrategyContext::new(bars, i, &mut broker);
                if feed.is_warmup(i) {
                    strategies[s].prenext(&mut ctx);
                } else {
                    strategies[s].next(&mut ctx);
                }
                let rejected = broker.take_unreported();
                notify(&mut strategies, &rejected);
            }

            if !bar.close.is_nan() {
                last_close = bar.close;
            }
            let equity = mark(&broker, last_close);
            broker.accounts_mut().record_equity(equity);
        }

        let expired = broker.expire_pending();
        notify(&mut strategies, &expired);

        let final_value = mark(&broker, last_close);
        info!(
            feed = %feed.name,
            bars = bars.len(),
            warmup = feed.warmup_len(),
            fills = broker.fills().len(),
            final_value,
            "run complete"
        );

        let accounts = broker.accounts();
        Ok(RunResult {
            feed_name: feed.name.clone(),
            starting_cash: accounts.initial_cash(),
            final_cash: accounts.cash(),
            final_value,
            equity_curve: accounts.equity_history().to_vec(),
            fills: broker.fills().to_vec(),
            orders: broker.orders().to_vec(),
            realized_pnl: accounts.realized_pnl(),
            commission_paid: accounts.commission_paid(),
            bars_processed: bars.len(),
            warmup_bars: feed.warmup_len(),
            first_bar: feed.first(),
            last_bar: feed.last(),
        })
    }
}

/// Value with the position marked at `price`; cash alone before any valid close.
fn mark(broker: &Broker, price: f64) -> f64 {
    if price.is_nan() {
        broker.cash()
    } else {
        broker.value(price)
    }
}

fn notify(strategies: &mut [Box<dyn Strategy>], orders: &[Order]) {
    for order in orders {
        for strategy in strategies.iter_mut() {
            strategy.notify_order(order);
        }
    }
}
