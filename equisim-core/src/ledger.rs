//! Portfolio ledger — the single writer for portfolio state.
//!
//! Orders pass through the full risk gate before any state mutates; a
//! rejected order leaves the portfolio byte-for-byte unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::costs::{CostError, CostModel};
use crate::domain::{
    Instrument, InstrumentType, OrderRequest, OrderSide, Portfolio, Transaction,
};

/// Pre-trade exposure limits, expressed as fractions of current equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Max fraction of equity a single position's notional may reach.
    pub max_position_fraction: Decimal,
    /// Max fraction of equity held in positions overall.
    pub max_total_exposure: Decimal,
    /// Max fraction of equity in any one sector.
    pub max_sector_fraction: Decimal,
    /// Fraction of equity that must remain in cash after a buy settles.
    pub cash_buffer: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_fraction: dec!(0.20),
            max_total_exposure: dec!(0.90),
            max_sector_fraction: dec!(0.40),
            cash_buffer: Decimal::ZERO,
        }
    }
}

/// Why an order was refused. Carried on dropped-signal records, so
/// serializable.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("position in {symbol} would reach {would_be} against limit {limit}")]
    PositionSizeLimit {
        symbol: String,
        would_be: Decimal,
        limit: Decimal,
    },
    #[error("total exposure would reach {would_be} against limit {limit}")]
    TotalExposureLimit { would_be: Decimal, limit: Decimal },
    #[error("sector {sector} exposure would reach {would_be} against limit {limit}")]
    SectorExposureLimit {
        sector: String,
        would_be: Decimal,
        limit: Decimal,
    },
    #[error("insufficient cash: need {required}, have {available}")]
    InsufficientCash {
        required: Decimal,
        available: Decimal,
    },
    #[error("insufficient holdings in {symbol}: want {requested}, hold {held}")]
    InsufficientHoldings {
        symbol: String,
        requested: u64,
        held: u64,
    },
    #[error("invalid order: {0}")]
    InvalidOrder(String),
}

impl From<CostError> for RejectReason {
    fn from(err: CostError) -> Self {
        RejectReason::InvalidOrder(err.to_string())
    }
}

/// Owns the portfolio, the cost model, and the last-seen marks.
#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    pub portfolio: Portfolio,
    cost_model: CostModel,
    limits: RiskLimits,
    instruments: HashMap<String, Instrument>,
    marks: HashMap<String, Decimal>,
}

impl PortfolioLedger {
    pub fn new(initial_capital: Decimal, cost_model: CostModel, limits: RiskLimits) -> Self {
        Self {
            portfolio: Portfolio::new(initial_capital),
            cost_model,
            limits,
            instruments: HashMap::new(),
            marks: HashMap::new(),
        }
    }

    /// Register instrument metadata (type and sector) for a symbol.
    /// Unregistered symbols price as plain equity with no sector.
    pub fn register_instrument(&mut self, instrument: Instrument) {
        self.instruments.insert(instrument.symbol.clone(), instrument);
    }

    pub fn instrument_type(&self, symbol: &str) -> InstrumentType {
        self.instruments
            .get(symbol)
            .map(|i| i.instrument_type)
            .unwrap_or(InstrumentType::Equity)
    }

    fn sector(&self, symbol: &str) -> Option<&str> {
        self.instruments
            .get(symbol)
            .and_then(|i| i.sector.as_deref())
    }

    /// Record the latest observed close for a symbol.
    pub fn mark(&mut self, symbol: &str, price: Decimal) {
        self.marks.insert(symbol.to_string(), price);
    }

    pub fn marks(&self) -> &HashMap<String, Decimal> {
        &self.marks
    }

    /// Current equity at last-seen marks.
    pub fn equity(&self) -> Decimal {
        self.portfolio.equity(&self.marks)
    }

    pub fn position_quantity(&self, symbol: &str) -> u64 {
        self.portfolio.position_quantity(symbol)
    }

    /// Execute an order at `price`, running the full risk gate first.
    ///
    /// Checks run in a fixed order (position size, total exposure,
    /// sector exposure, cash) against the would-be post-trade state, so
    /// the first violated limit names the rejection. Sells only check
    /// holdings. No state mutates on any rejection path.
    pub fn execute(
        &mut self,
        order: &OrderRequest,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, RejectReason> {
        if order.quantity == 0 {
            return Err(RejectReason::InvalidOrder("zero quantity".into()));
        }
        let instrument_type = self.instrument_type(&order.symbol);
        let costs =
            self.cost_model
                .calculate_total_cost(price, order.quantity, order.side, instrument_type)?;
        let gross = price * Decimal::from(order.quantity);

        match order.side {
            OrderSide::Buy => {
                self.check_buy(order, price, gross + costs.total)?;
                let tx = self
                    .portfolio
                    .apply_buy(&order.symbol, order.quantity, price, costs, timestamp);
                Ok(tx)
            }
            OrderSide::Sell => {
                let held = self.portfolio.position_quantity(&order.symbol);
                if order.quantity > held {
                    return Err(RejectReason::InsufficientHoldings {
                        symbol: order.symbol.clone(),
                        requested: order.quantity,
                        held,
                    });
                }
                let tx = self
                    .portfolio
                    .apply_sell(&order.symbol, order.quantity, price, costs, timestamp);
                Ok(tx)
            }
        }
    }

    /// Risk gate for buys, evaluated against the would-be post-trade
    /// state. Ratio limits compare notionals against limit * equity to
    /// avoid dividing by a zero or negative equity.
    fn check_buy(
        &self,
        order: &OrderRequest,
        price: Decimal,
        total_outlay: Decimal,
    ) -> Result<(), RejectReason> {
        let equity = self.equity();
        let added = price * Decimal::from(order.quantity);

        // 1. single-position size
        let held_value = self
            .portfolio
            .positions
            .get(&order.symbol)
            .map(|p| {
                let mark = self.marks.get(&order.symbol).copied().unwrap_or_else(|| p.average_cost());
                p.market_value(mark)
            })
            .unwrap_or(Decimal::ZERO);
        let would_be_position = held_value + added;
        if would_be_position > self.limits.max_position_fraction * equity {
            return Err(RejectReason::PositionSizeLimit {
                symbol: order.symbol.clone(),
                would_be: would_be_position,
                limit: self.limits.max_position_fraction * equity,
            });
        }

        // 2. total exposure
        let current_exposure: Decimal = self
            .portfolio
            .positions
            .values()
            .map(|p| {
                let mark = self.marks.get(&p.symbol).copied().unwrap_or_else(|| p.average_cost());
                p.market_value(mark)
            })
            .sum();
        let would_be_exposure = current_exposure + added;
        if would_be_exposure > self.limits.max_total_exposure * equity {
            return Err(RejectReason::TotalExposureLimit {
                would_be: would_be_exposure,
                limit: self.limits.max_total_exposure * equity,
            });
        }

        // 3. sector exposure, skipped when the symbol has no sector
        if let Some(sector) = self.sector(&order.symbol) {
            let sector_exposure: Decimal = self
                .portfolio
                .positions
                .values()
                .filter(|p| self.sector(&p.symbol) == Some(sector))
                .map(|p| {
                    let mark = self.marks.get(&p.symbol).copied().unwrap_or_else(|| p.average_cost());
                    p.market_value(mark)
                })
                .sum();
            let would_be_sector = sector_exposure + added;
            if would_be_sector > self.limits.max_sector_fraction * equity {
                return Err(RejectReason::SectorExposureLimit {
                    sector: sector.to_string(),
                    would_be: would_be_sector,
                    limit: self.limits.max_sector_fraction * equity,
                });
            }
        }

        // 4. cash, less the slice of equity reserved as a buffer
        let available = self.portfolio.cash - self.limits.cash_buffer * equity;
        if total_outlay > available {
            return Err(RejectReason::InsufficientCash {
                required: total_outlay,
                available: self.portfolio.cash,
            });
        }

        Ok(())
    }
}
