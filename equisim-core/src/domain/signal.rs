//! Signal — a strategy's expressed trading intent, not yet an order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the strategy wants to do with a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
    /// Close the full position in the signal's symbol.
    Close,
    /// Close every open position.
    CloseAll,
}

/// Signal construction failure.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidSignal {
    #[error("signal strength must be within [-1.0, 1.0], got {0}")]
    StrengthOutOfRange(f64),
    #[error("signal quantity must be positive when given")]
    ZeroQuantity,
}

/// Trading intent emitted by `Strategy::on_data`.
///
/// `strength` scales position sizing when no explicit quantity is given;
/// it is validated into [-1.0, 1.0] at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub kind: SignalKind,
    pub strength: f64,
    pub quantity: Option<u64>,
    pub limit_price: Option<Decimal>,
    pub reason: String,
}

impl Signal {
    pub fn new(
        timestamp: DateTime<Utc>,
        symbol: impl Into<String>,
        kind: SignalKind,
        strength: f64,
        reason: impl Into<String>,
    ) -> Result<Self, InvalidSignal> {
        if !(-1.0..=1.0).contains(&strength) || strength.is_nan() {
            return Err(InvalidSignal::StrengthOutOfRange(strength));
        }
        Ok(Self {
            timestamp,
            symbol: symbol.into(),
            kind,
            strength,
            quantity: None,
            limit_price: None,
            reason: reason.into(),
        })
    }

    /// Attach an explicit share count, overriding strength-based sizing.
    pub fn with_quantity(mut self, quantity: u64) -> Result<Self, InvalidSignal> {
        if quantity == 0 {
            return Err(InvalidSignal::ZeroQuantity);
        }
        self.quantity = Some(quantity);
        Ok(self)
    }

    /// Attach a limit price; without one the order fills at market.
    pub fn with_limit_price(mut self, price: Decimal) -> Self {
        self.limit_price = Some(price);
        self
    }
}
