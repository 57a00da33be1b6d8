//! MarketBar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV observation for a symbol at a timestamp.
///
/// Immutable once produced. The replay stream is ordered by
/// `(timestamp, symbol)`; a regression of that key is a `DataError`.
/// Prices are decimal so that ledger arithmetic stays exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl MarketBar {
    /// The stream ordering key.
    pub fn ordering_key(&self) -> (DateTime<Utc>, &str) {
        (self.timestamp, self.symbol.as_str())
    }

    /// Trading session this bar belongs to (one venue clock, UTC dates).
    pub fn session_date(&self) -> chrono::NaiveDate {
        self.timestamp.date_naive()
    }

    /// Basic OHLCV sanity check: positive prices, high/low bracket open
    /// and close.
    pub fn is_sane(&self) -> bool {
        self.open > Decimal::ZERO
            && self.close > Decimal::ZERO
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
