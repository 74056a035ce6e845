//! The data feed handed to the engine: an owned copy of the resolved slice.

use crate::data::{fingerprint, DateWindow};
use crate::domain::Bar;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An owned run of bars plus the dates they were selected for.
///
/// The first `warmup_len` bars precede `from_date` and exist only to prime
/// indicators; the engine routes them to `Strategy::prenext`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFeed {
    pub name: String,
    bars: Vec<Bar>,
    pub from_date: NaiveDateTime,
    pub to_date: Option<NaiveDateTime>,
    warmup_len: usize,
}

impl DataFeed {
    /// Wrap a copied slice. `warmup_len` is clamped to the slice length.
    pub fn new(
        name: impl Into<String>,
        bars: Vec<Bar>,
        window: &DateWindow,
        warmup_len: usize,
    ) -> Self {
        let warmup_len = warmup_len.min(bars.len());
        Self {
            name: name.into(),
            bars,
            from_date: window.start,
            to_date: window.end,
            warmup_len,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn warmup_len(&self) -> usize {
        self.warmup_len
    }

    /// Bars at or after the start boundary.
    pub fn live_len(&self) -> usize {
        self.bars.len() - self.warmup_len
    }

    pub fn is_warmup(&self, index: usize) -> bool {
        index < self.warmup_len
    }

    pub fn first(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// Timestamp of the first live bar, if any.
    pub fn live_start(&self) -> Option<NaiveDateTime> {
        self.bars.get(self.warmup_len).map(|b| b.timestamp)
    }

    /// BLAKE3 fingerprint of the bars, identifying the dataset of a run.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bars(n: usize) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2021, 1, 31)
            .unwrap()
            .and_hms_opt(23, 58, 0)
            .unwrap();
        (0..n)
            .map(|i| Bar {
                timestamp: base + Duration::minutes(i as i64),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 0.0,
            })
            .collect()
    }

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2021, 2, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            None,
            2,
        )
    }

    #[test]
    fn warmup_bars_precede_live_start() {
        let feed = DataFeed::new("XRPUSDT", bars(5), &window(), 2);
        assert!(feed.is_warmup(0));
        assert!(feed.is_warmup(1));
        assert!(!feed.is_warmup(2));
        assert_eq!(feed.live_len(), 3);
        assert_eq!(feed.live_start(), Some(feed.from_date));
        assert_eq!(feed.to_date, None);
    }

    #[test]
    fn warmup_len_clamped_to_slice() {
        let feed = DataFeed::new("XRPUSDT", bars(1), &window(), 2);
        assert_eq!(feed.warmup_len(), 1);
        assert_eq!(feed.live_len(), 0);
        assert_eq!(feed.live_start(), None);
    }

    #[test]
    fn empty_feed_has_no_bounds() {
        let feed = DataFeed::new("XRPUSDT", Vec::new(), &window(), 0);
        assert!(feed.is_empty());
        assert_eq!(feed.first(), None);
        assert_eq!(feed.last(), None);
    }
}
