//! Date-window resolution over a sorted timestamp index.
//!
//! Boundary searches follow sorted-insertion semantics: the start boundary
//! uses a left-side search (first index `>= target`), the end boundary a
//! right-side search (first index `> target`), so an `end` that lands on an
//! existing bar includes that bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// First index `i` with `timestamps[i] >= target`; `len` if none.
pub fn search_left(timestamps: &[NaiveDateTime], target: NaiveDateTime) -> usize {
    timestamps.partition_point(|ts| *ts < target)
}

/// First index `i` with `timestamps[i] > target`; `len` if none.
pub fn search_right(timestamps: &[NaiveDateTime], target: NaiveDateTime) -> usize {
    timestamps.partition_point(|ts| *ts <= target)
}

/// The requested slice of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    /// Extra bars to include before the first bar at-or-after `start`.
    pub warmup_bars: usize,
}

impl DateWindow {
    pub fn new(start: NaiveDateTime, end: Option<NaiveDateTime>, warmup_bars: usize) -> Self {
        Self {
            start,
            end,
            warmup_bars,
        }
    }

    /// Resolve the window to row positions over a non-decreasing index.
    ///
    /// A start before all data clamps the warm-up start to 0; an end after
    /// all data keeps every remaining bar. An end that falls before the
    /// warm-up start produces an empty slice rather than an error.
    pub fn resolve(&self, timestamps: &[NaiveDateTime]) -> SliceBounds {
        let start = search_left(timestamps, self.start);
        let warmup_start = start.saturating_sub(self.warmup_bars);
        let end = match self.end {
            Some(end) => search_right(timestamps, end),
            None => timestamps.len(),
        };
        SliceBounds {
            warmup_start,
            start,
            end: end.max(warmup_start),
        }
    }
}

/// Row positions of a resolved window: rows `[warmup_start, end)` are kept,
/// rows `[warmup_start, start)` are warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceBounds {
    pub warmup_start: usize,
    pub start: usize,
    pub end: usize,
}

impl SliceBounds {
    pub fn len(&self) -> usize {
        self.end - self.warmup_start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of kept bars that precede the start boundary.
    pub fn warmup_len(&self) -> usize {
        (self.start - self.warmup_start).min(self.len())
    }
}
