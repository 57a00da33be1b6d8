//! Serializable backtest configuration.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use equisim_core::{
    CommissionTier, CostError, CostModel, MarketCondition, RiskLimits, TaxSchedule,
};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Serializable configuration for a single backtest run.
///
/// Captures everything needed to reproduce a run: strategy, date range,
/// capital, trading friction, and risk limits. Loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub strategy: StrategyConfig,

    /// Backtest start date (inclusive).
    pub start_date: NaiveDate,

    /// Backtest end date (inclusive).
    pub end_date: NaiveDate,

    pub initial_capital: Decimal,

    /// Fraction of equity committed per unsized buy signal.
    #[serde(default = "default_sizing_fraction")]
    pub sizing_fraction: Decimal,

    /// Annual risk-free rate used by Sharpe/Sortino.
    #[serde(default)]
    pub risk_free_rate: f64,

    #[serde(default)]
    pub costs: CostConfig,

    #[serde(default)]
    pub risk_limits: RiskLimits,
}

fn default_sizing_fraction() -> Decimal {
    dec!(0.10)
}

impl BacktestConfig {
    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId, so artifacts can
    /// be correlated across invocations.
    pub fn run_id(&self) -> RunId {
        // Serialization of a config that round-tripped through serde
        // cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = blake3::hash(json.as_bytes());
        hash.to_hex().to_string()
    }

    /// Cheap structural validation, run before the engine's own checks.
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        if self.start_date >= self.end_date {
            return Err(ConfigFileError::Invalid(format!(
                "start_date {} must be before end_date {}",
                self.start_date, self.end_date
            )));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigFileError::Invalid(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.sizing_fraction <= Decimal::ZERO || self.sizing_fraction > Decimal::ONE {
            return Err(ConfigFileError::Invalid(format!(
                "sizing_fraction must be in (0, 1], got {}",
                self.sizing_fraction
            )));
        }
        self.costs.build()?;
        Ok(())
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigFileError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Strategy selection (serializable enum).
///
/// `Custom` names a strategy registered at runtime through the
/// [`crate::strategies::StrategyRegistry`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Moving average crossover: short MA crosses long MA.
    MaCrossover { short_period: usize, long_period: usize },

    /// Buy once on the first bar of each symbol, hold to the end.
    BuyAndHold,

    /// Contrarian RSI: buy oversold, close the position overbought.
    Rsi {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_rsi_oversold")]
        oversold: f64,
        #[serde(default = "default_rsi_overbought")]
        overbought: f64,
    },

    /// Bollinger %B reversal with a bandwidth squeeze filter.
    BollingerBands {
        #[serde(default = "default_bb_period")]
        period: usize,
        #[serde(default = "default_bb_num_std")]
        num_std: f64,
        #[serde(default = "default_bb_buy_threshold")]
        buy_threshold: f64,
        #[serde(default = "default_bb_sell_threshold")]
        sell_threshold: f64,
        #[serde(default = "default_bb_bandwidth_threshold")]
        bandwidth_threshold: f64,
    },

    /// A strategy registered by name with arbitrary parameters.
    Custom {
        name: String,
        #[serde(default)]
        params: HashMap<String, serde_json::Value>,
    },
}

fn default_rsi_period() -> usize {
    14
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_rsi_overbought() -> f64 {
    70.0
}

fn default_bb_period() -> usize {
    20
}

fn default_bb_num_std() -> f64 {
    2.0
}

fn default_bb_buy_threshold() -> f64 {
    0.2
}

fn default_bb_sell_threshold() -> f64 {
    0.8
}

fn default_bb_bandwidth_threshold() -> f64 {
    0.1
}

/// Trading friction settings, mapped onto a [`CostModel`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostConfig {
    /// Commission bands; empty means the standard schedule.
    pub commission_tiers: Vec<CommissionTier>,
    /// Bracket-by-bracket commission instead of flat band pricing.
    pub progressive_commission: bool,
    pub min_commission: Decimal,
    pub max_commission: Option<Decimal>,
    pub tax: TaxSchedule,
    pub slippage_rate: Decimal,
    pub market_condition: MarketCondition,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            commission_tiers: Vec::new(),
            progressive_commission: false,
            min_commission: Decimal::ZERO,
            max_commission: None,
            tax: TaxSchedule::default(),
            slippage_rate: dec!(0.001),
            market_condition: MarketCondition::Sideways,
        }
    }
}

impl CostConfig {
    pub fn build(&self) -> Result<CostModel, ConfigFileError> {
        let tiers = if self.commission_tiers.is_empty() {
            CostModel::standard_tiers()
        } else {
            self.commission_tiers.clone()
        };
        let model = CostModel::from_parts(
            tiers,
            self.progressive_commission,
            self.min_commission,
            self.max_commission,
            self.tax.clone(),
            self.slippage_rate,
            self.market_condition,
        )?;
        Ok(model)
    }
}

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid cost schedule: {0}")]
    Costs(#[from] CostError),
    #[error("{0}")]
    Invalid(String),
}
