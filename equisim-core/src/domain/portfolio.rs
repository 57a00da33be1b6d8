//! Portfolio — aggregate state of cash, positions, and the trade log.

use super::position::Position;
use super::transaction::{CostComponents, Transaction};
use super::OrderSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Aggregate portfolio state, owned exclusively by one
/// [`crate::ledger::PortfolioLedger`] for the duration of a run.
///
/// The accounting identity must hold at every snapshot, exactly in
/// decimal arithmetic:
///
/// `cash + market value == initial_capital + realized gross P&L
///  + unrealized P&L - total costs paid`
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: Decimal,
    pub initial_capital: Decimal,
    pub positions: HashMap<String, Position>,
    /// Append-only; entries are never mutated after insertion.
    pub transactions: Vec<Transaction>,
    /// Cumulative sold notional minus proportional cost basis over all
    /// sells.
    pub realized_pnl_gross: Decimal,
    pub total_commission: Decimal,
    pub total_tax: Decimal,
    pub total_slippage: Decimal,
}

impl Portfolio {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            positions: HashMap::new(),
            transactions: Vec::new(),
            realized_pnl_gross: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            total_slippage: Decimal::ZERO,
        }
    }

    pub fn total_costs(&self) -> Decimal {
        self.total_commission + self.total_tax + self.total_slippage
    }

    /// Net realized P&L as recorded on sell transactions
    /// (gross minus each sell's own costs).
    pub fn realized_pnl_net(&self) -> Decimal {
        self.transactions
            .iter()
            .filter_map(|t| t.realized_pnl)
            .sum()
    }

    /// Total equity = cash + sum of position market values at the given
    /// prices. Symbols with no quote are valued at average cost.
    pub fn equity(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        let market_value: Decimal = self
            .positions
            .values()
            .map(|pos| {
                let price = prices.get(&pos.symbol).copied().unwrap_or_else(|| pos.average_cost());
                pos.market_value(price)
            })
            .sum();
        self.cash + market_value
    }

    pub fn unrealized_pnl(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.positions
            .values()
            .map(|pos| {
                let price = prices.get(&pos.symbol).copied().unwrap_or_else(|| pos.average_cost());
                pos.unrealized_pnl(price)
            })
            .sum()
    }

    /// Deviation from the accounting identity. Must be exactly zero after
    /// any sequence of valid trades.
    pub fn identity_gap(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        let expected = self.initial_capital + self.realized_pnl_gross
            + self.unrealized_pnl(prices)
            - self.total_costs();
        self.equity(prices) - expected
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.get(symbol).is_some_and(|p| p.quantity > 0)
    }

    pub fn position_quantity(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).map_or(0, |p| p.quantity)
    }

    /// Commit a buy fill. Caller must have already verified cash covers
    /// the gross amount plus costs.
    pub(crate) fn apply_buy(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: Decimal,
        costs: CostComponents,
        timestamp: DateTime<Utc>,
    ) -> Transaction {
        let gross = price * Decimal::from(quantity);
        self.cash -= gross + costs.total;
        match self.positions.get_mut(symbol) {
            Some(pos) => pos.add(quantity, price),
            None => {
                self.positions
                    .insert(symbol.to_string(), Position::open(symbol, quantity, price));
            }
        }
        self.record_costs(&costs);
        let tx = Transaction {
            timestamp,
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            quantity,
            fill_price: price,
            costs,
            realized_pnl: None,
        };
        self.transactions.push(tx.clone());
        tx
    }

    /// Commit a sell fill. Caller must have already verified holdings
    /// cover the quantity. Fully closed positions are removed.
    pub(crate) fn apply_sell(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: Decimal,
        costs: CostComponents,
        timestamp: DateTime<Utc>,
    ) -> Transaction {
        let gross = price * Decimal::from(quantity);
        let gross_pnl = match self.positions.get_mut(symbol) {
            Some(pos) => {
                let pnl = pos.reduce(quantity, price);
                if pos.quantity == 0 {
                    self.positions.remove(symbol);
                }
                pnl
            }
            None => Decimal::ZERO,
        };
        self.cash += gross - costs.total;
        self.realized_pnl_gross += gross_pnl;
        self.record_costs(&costs);
        let tx = Transaction {
            timestamp,
            symbol: symbol.to_string(),
            side: OrderSide::Sell,
            quantity,
            fill_price: price,
            costs,
            realized_pnl: Some(gross_pnl - costs.total),
        };
        self.transactions.push(tx.clone());
        tx
    }

    fn record_costs(&mut self, costs: &CostComponents) {
        self.total_commission += costs.commission;
        self.total_tax += costs.tax;
        self.total_slippage += costs.slippage;
    }
}
