//! Cost model — commission, sell-side tax, and regime-scaled slippage.
//!
//! Pure and deterministic: the same (price, quantity, side, instrument)
//! always prices to the same `CostComponents`. All amounts are decimal
//! and rounded half-up to cents.

use crate::domain::{CostComponents, InstrumentType, OrderSide};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Market regime; scales slippage cost regardless of trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    Bull,
    Bear,
    #[default]
    Sideways,
    Volatile,
}

impl MarketCondition {
    pub fn multiplier(self) -> Decimal {
        match self {
            MarketCondition::Bull => dec!(0.8),
            MarketCondition::Bear => dec!(1.2),
            MarketCondition::Sideways => dec!(1.0),
            MarketCondition::Volatile => dec!(1.5),
        }
    }
}

/// One commission band: applies `rate` up to `limit` notional
/// (`None` = unbounded, must be the final band).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionTier {
    pub limit: Option<Decimal>,
    pub rate: Decimal,
}

/// Sell-side tax rate per instrument class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSchedule {
    pub equity: Decimal,
    pub etf: Decimal,
    pub reit: Decimal,
}

impl Default for TaxSchedule {
    fn default() -> Self {
        Self {
            equity: InstrumentType::Equity.default_tax_rate(),
            etf: InstrumentType::Etf.default_tax_rate(),
            reit: InstrumentType::Reit.default_tax_rate(),
        }
    }
}

impl TaxSchedule {
    pub fn rate_for(&self, instrument_type: InstrumentType) -> Decimal {
        match instrument_type {
            InstrumentType::Equity => self.equity,
            InstrumentType::Etf => self.etf,
            InstrumentType::Reit => self.reit,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CostError {
    #[error("price and quantity must be positive (price={price}, quantity={quantity})")]
    InvalidInput { price: Decimal, quantity: u64 },
    #[error("invalid commission schedule: {0}")]
    InvalidSchedule(String),
}

/// Trade friction model.
///
/// Commission uses a tiered schedule keyed by notional. In flat mode the
/// band containing the notional prices the whole trade; in progressive
/// mode each band's rate applies only to the slice of notional inside
/// that band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub tiers: Vec<CommissionTier>,
    pub progressive: bool,
    pub min_commission: Decimal,
    pub max_commission: Option<Decimal>,
    pub tax: TaxSchedule,
    pub slippage_rate: Decimal,
    pub market_condition: MarketCondition,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            tiers: CostModel::standard_tiers(),
            progressive: false,
            min_commission: Decimal::ZERO,
            max_commission: None,
            tax: TaxSchedule::default(),
            slippage_rate: dec!(0.001),
            market_condition: MarketCondition::Sideways,
        }
    }
}

impl CostModel {
    /// The standard brokerage schedule: decreasing marginal rate as the
    /// notional grows.
    pub fn standard_tiers() -> Vec<CommissionTier> {
        vec![
            CommissionTier {
                limit: Some(dec!(1000000)),
                rate: dec!(0.002),
            },
            CommissionTier {
                limit: Some(dec!(10000000)),
                rate: dec!(0.0015),
            },
            CommissionTier {
                limit: Some(dec!(100000000)),
                rate: dec!(0.001),
            },
            CommissionTier {
                limit: None,
                rate: dec!(0.0005),
            },
        ]
    }

    /// Build a model with a custom schedule, validating tier shape:
    /// strictly increasing limits, an unbounded final band, and
    /// non-negative rates.
    pub fn from_parts(
        tiers: Vec<CommissionTier>,
        progressive: bool,
        min_commission: Decimal,
        max_commission: Option<Decimal>,
        tax: TaxSchedule,
        slippage_rate: Decimal,
        market_condition: MarketCondition,
    ) -> Result<Self, CostError> {
        validate_tiers(&tiers)?;
        if slippage_rate < Decimal::ZERO {
            return Err(CostError::InvalidSchedule(
                "slippage rate must be non-negative".into(),
            ));
        }
        Ok(Self {
            tiers,
            progressive,
            min_commission,
            max_commission,
            tax,
            slippage_rate,
            market_condition,
        })
    }

    /// Commission for a notional, clamped to [min, max] and rounded to
    /// cents.
    pub fn commission(&self, notional: Decimal) -> Decimal {
        let raw = if self.progressive {
            self.progressive_commission(notional)
        } else {
            notional * self.flat_rate(notional)
        };
        let mut commission = raw.max(self.min_commission);
        if let Some(max) = self.max_commission {
            commission = commission.min(max);
        }
        round_cents(commission)
    }

    /// Rate of the band the notional falls within.
    fn flat_rate(&self, notional: Decimal) -> Decimal {
        for tier in &self.tiers {
            match tier.limit {
                Some(limit) if notional <= limit => return tier.rate,
                Some(_) => continue,
                None => return tier.rate,
            }
        }
        // Unreachable for validated schedules; standard_tiers always has
        // an unbounded band.
        Decimal::ZERO
    }

    /// True marginal/bracket calculation: each band's rate applies only
    /// to the portion of notional inside that band.
    fn progressive_commission(&self, notional: Decimal) -> Decimal {
        let mut remaining = notional;
        let mut total = Decimal::ZERO;
        let mut prev_limit = Decimal::ZERO;

        for tier in &self.tiers {
            if remaining <= Decimal::ZERO {
                break;
            }
            match tier.limit {
                Some(limit) => {
                    let band = (limit - prev_limit).min(remaining);
                    total += band * tier.rate;
                    remaining -= band;
                    prev_limit = limit;
                }
                None => {
                    total += remaining * tier.rate;
                    remaining = Decimal::ZERO;
                }
            }
        }
        total
    }

    /// Sell-side tax; buys are never taxed.
    pub fn tax(&self, notional: Decimal, side: OrderSide, instrument_type: InstrumentType) -> Decimal {
        match side {
            OrderSide::Buy => Decimal::ZERO,
            OrderSide::Sell => round_cents(notional * self.tax.rate_for(instrument_type)),
        }
    }

    /// Slippage scaled by the current market regime; charged on both
    /// sides.
    pub fn slippage(&self, notional: Decimal) -> Decimal {
        round_cents(notional * self.slippage_rate * self.market_condition.multiplier())
    }

    /// Full friction breakdown for a trade. Fails only on non-positive
    /// price or quantity.
    pub fn calculate_total_cost(
        &self,
        price: Decimal,
        quantity: u64,
        side: OrderSide,
        instrument_type: InstrumentType,
    ) -> Result<CostComponents, CostError> {
        if price <= Decimal::ZERO || quantity == 0 {
            return Err(CostError::InvalidInput { price, quantity });
        }
        let notional = price * Decimal::from(quantity);
        Ok(CostComponents::new(
            self.commission(notional),
            self.tax(notional, side, instrument_type),
            self.slippage(notional),
        ))
    }
}

fn validate_tiers(tiers: &[CommissionTier]) -> Result<(), CostError> {
    if tiers.is_empty() {
        return Err(CostError::InvalidSchedule("schedule is empty".into()));
    }
    let mut prev_limit: Option<Decimal> = None;
    for (i, tier) in tiers.iter().enumerate() {
        if tier.rate < Decimal::ZERO {
            return Err(CostError::InvalidSchedule(format!(
                "tier {i} has negative rate {}",
                tier.rate
            )));
        }
        match (tier.limit, prev_limit) {
            (Some(limit), _) if limit <= Decimal::ZERO => {
                return Err(CostError::InvalidSchedule(format!(
                    "tier {i} limit {limit} must be positive"
                )));
            }
            (Some(limit), Some(prev)) if limit <= prev => {
                return Err(CostError::InvalidSchedule(format!(
                    "tier {i} limit {limit} does not increase past {prev}"
                )));
            }
            (None, _) if i + 1 != tiers.len() => {
                return Err(CostError::InvalidSchedule(
                    "unbounded band must be the final tier".into(),
                ));
            }
            _ => {}
        }
        prev_limit = tier.limit.or(prev_limit);
    }
    match tiers.last() {
        Some(last) if last.limit.is_none() => Ok(()),
        _ => Err(CostError::InvalidSchedule(
            "schedule must end with an unbounded band".into(),
        )),
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
