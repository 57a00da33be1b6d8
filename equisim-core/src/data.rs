//! Market data sources — pull-based bar iteration.
//!
//! The engine pulls bars one at a time and enforces ordering itself;
//! sources only promise to yield what they have, in the order they
//! hold it.

use crate::domain::MarketBar;
use crate::error::DataError;

/// A stream of historical bars. `next_bar` yields `Ok(None)` once
/// exhausted; a source error aborts the run.
pub trait MarketDataSource {
    fn next_bar(&mut self) -> Result<Option<MarketBar>, DataError>;

    /// Total bar count when known, for progress reporting.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// In-memory source over a pre-sorted `Vec<MarketBar>`.
pub struct VecSource {
    bars: std::vec::IntoIter<MarketBar>,
    total: usize,
}

impl VecSource {
    pub fn new(bars: Vec<MarketBar>) -> Self {
        let total = bars.len();
        Self {
            bars: bars.into_iter(),
            total,
        }
    }
}

impl MarketDataSource for VecSource {
    fn next_bar(&mut self) -> Result<Option<MarketBar>, DataError> {
        Ok(self.bars.next())
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// Batching wrapper over another source: pulls `batch_size` bars ahead
/// into a buffer so slow underlying sources amortize their per-pull
/// cost. Order is preserved exactly.
pub struct ReadAhead<S> {
    inner: S,
    buffer: std::collections::VecDeque<MarketBar>,
    batch_size: usize,
    exhausted: bool,
}

impl<S: MarketDataSource> ReadAhead<S> {
    pub fn new(inner: S, batch_size: usize) -> Self {
        Self {
            inner,
            buffer: std::collections::VecDeque::with_capacity(batch_size.max(1)),
            batch_size: batch_size.max(1),
            exhausted: false,
        }
    }

    fn refill(&mut self) -> Result<(), DataError> {
        while self.buffer.len() < self.batch_size && !self.exhausted {
            match self.inner.next_bar()? {
                Some(bar) => self.buffer.push_back(bar),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }
}

impl<S: MarketDataSource> MarketDataSource for ReadAhead<S> {
    fn next_bar(&mut self) -> Result<Option<MarketBar>, DataError> {
        if self.buffer.is_empty() {
            self.refill()?;
        }
        Ok(self.buffer.pop_front())
    }

    /// The hint reports the stream's total, so buffered bars are not
    /// added on top of it.
    fn size_hint(&self) -> Option<usize> {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};
    use rust_decimal_macros::dec;

    fn bar(hour: u32) -> MarketBar {
        MarketBar {
            symbol: "005930".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap(),
            open: dec!(70000),
            high: dec!(70500),
            low: dec!(69500),
            close: dec!(70200),
            volume: 1_000,
        }
    }

    #[test]
    fn vec_source_drains_in_order() {
        let mut source = VecSource::new(vec![bar(9), bar(10), bar(11)]);
        assert_eq!(source.size_hint(), Some(3));
        assert_eq!(source.next_bar().unwrap().unwrap().timestamp.hour(), 9);
        assert_eq!(source.next_bar().unwrap().unwrap().timestamp.hour(), 10);
        assert_eq!(source.next_bar().unwrap().unwrap().timestamp.hour(), 11);
        assert!(source.next_bar().unwrap().is_none());
    }

    #[test]
    fn read_ahead_preserves_order() {
        let bars: Vec<_> = (0..10).map(bar).collect();
        let mut wrapped = ReadAhead::new(VecSource::new(bars), 3);
        for hour in 0..10 {
            let got = wrapped.next_bar().unwrap().unwrap();
            assert_eq!(got.timestamp.hour(), hour);
        }
        assert!(wrapped.next_bar().unwrap().is_none());
    }

    #[test]
    fn read_ahead_keeps_the_total_hint_stable() {
        let bars: Vec<_> = (0..10).map(bar).collect();
        let mut wrapped = ReadAhead::new(VecSource::new(bars), 4);
        assert_eq!(wrapped.size_hint(), Some(10));
        wrapped.next_bar().unwrap();
        // Buffered bars must not inflate the total
        assert_eq!(wrapped.size_hint(), Some(10));
    }
}
