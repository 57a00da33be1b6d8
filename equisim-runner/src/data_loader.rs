//! CSV bar loading for the runner.
//!
//! One row per bar: symbol, timestamp (RFC 3339), open, high, low,
//! close, volume. Rows may arrive in any order; loading sorts them into
//! the (timestamp, symbol) order the engine requires and rejects
//! malformed bars up front.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use equisim_core::MarketBar;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read bars from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("bad CSV record: {0}")]
    Csv(#[from] csv::Error),
    #[error("insane bar for {symbol} at {timestamp}: high/low do not bracket open/close")]
    InsaneBar {
        symbol: String,
        timestamp: DateTime<Utc>,
    },
    #[error("duplicate bar for {symbol} at {timestamp}")]
    DuplicateBar {
        symbol: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Deserialize)]
struct BarRow {
    symbol: String,
    timestamp: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: u64,
}

impl From<BarRow> for MarketBar {
    fn from(row: BarRow) -> Self {
        MarketBar {
            symbol: row.symbol,
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// Load, validate, and sort bars from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<Vec<MarketBar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let bars = read_bars(file)?;
    info!(path = %path.display(), count = bars.len(), "loaded bars");
    Ok(bars)
}

/// Same as [`load_bars_csv`] but over any reader.
pub fn read_bars(reader: impl Read) -> Result<Vec<MarketBar>, LoadError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut bars: Vec<MarketBar> = Vec::new();
    for row in csv_reader.deserialize::<BarRow>() {
        let bar: MarketBar = row?.into();
        if !bar.is_sane() {
            return Err(LoadError::InsaneBar {
                symbol: bar.symbol,
                timestamp: bar.timestamp,
            });
        }
        bars.push(bar);
    }
    bars.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
    for w in bars.windows(2) {
        if w[0].ordering_key() == w[1].ordering_key() {
            return Err(LoadError::DuplicateBar {
                symbol: w[1].symbol.clone(),
                timestamp: w[1].timestamp,
            });
        }
    }
    Ok(bars)
}
