//! Transaction — an immutable, append-only ledger entry.

use super::order::OrderSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Breakdown of a trade's frictions. All components are non-negative
/// and `total` is always their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostComponents {
    pub commission: Decimal,
    pub tax: Decimal,
    pub slippage: Decimal,
    pub total: Decimal,
}

impl CostComponents {
    pub fn new(commission: Decimal, tax: Decimal, slippage: Decimal) -> Self {
        Self {
            commission,
            tax,
            slippage,
            total: commission + tax + slippage,
        }
    }

    pub fn zero() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }
}

/// One executed fill. Never mutated after creation.
///
/// `realized_pnl` is present on sells only: sold notional minus the
/// proportional cost basis, minus `costs.total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub fill_price: Decimal,
    pub costs: CostComponents,
    pub realized_pnl: Option<Decimal>,
}

impl Transaction {
    /// Trade value before costs.
    pub fn gross_amount(&self) -> Decimal {
        self.fill_price * Decimal::from(self.quantity)
    }

    /// Signed cash effect: negative for buys, positive for sells.
    pub fn net_cash_flow(&self) -> Decimal {
        match self.side {
            OrderSide::Buy => -(self.gross_amount() + self.costs.total),
            OrderSide::Sell => self.gross_amount() - self.costs.total,
        }
    }
}
