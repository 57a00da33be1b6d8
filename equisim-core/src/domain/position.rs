//! Long-only position carrying its exact total cost basis.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open holding. Quantity is always positive while the position
/// exists; the ledger removes the entry when the quantity reaches zero.
///
/// The basis is stored as an exact total rather than a per-share
/// average, so valuation and realized P&L never inherit rounding from
/// a non-terminating division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    cost_basis: Decimal,
}

impl Position {
    pub fn open(symbol: impl Into<String>, quantity: u64, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            cost_basis: Decimal::from(quantity) * price,
        }
    }

    /// Exact total cost basis of the holding.
    pub fn cost_basis(&self) -> Decimal {
        self.cost_basis
    }

    /// Quantity-weighted average cost per share. Derived for display
    /// and fallback marks; valuation works from the exact basis.
    pub fn average_cost(&self) -> Decimal {
        if self.quantity == 0 {
            Decimal::ZERO
        } else {
            self.cost_basis / Decimal::from(self.quantity)
        }
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.quantity) * price
    }

    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.market_value(price) - self.cost_basis
    }

    /// Add shares at a fill price. The basis grows by the exact notional.
    pub fn add(&mut self, quantity: u64, price: Decimal) {
        self.quantity += quantity;
        self.cost_basis += Decimal::from(quantity) * price;
    }

    /// Remove shares, returning the gross realized P&L against the
    /// proportional slice of the basis. The remaining basis is computed
    /// by subtraction, so the sold and remaining slices always sum to
    /// the old basis exactly.
    pub fn reduce(&mut self, quantity: u64, price: Decimal) -> Decimal {
        debug_assert!(quantity <= self.quantity, "ledger must pre-check holdings");
        let sold_basis = if quantity == self.quantity {
            self.cost_basis
        } else {
            self.cost_basis * Decimal::from(quantity) / Decimal::from(self.quantity)
        };
        self.quantity -= quantity;
        self.cost_basis -= sold_basis;
        Decimal::from(quantity) * price - sold_basis
    }
}
