//! Core backtesting engine: domain types, cost model, portfolio
//! ledger, and the bar-driven simulation loop.
//!
//! All monetary arithmetic is decimal end to end; floats appear only in
//! signal strengths and downstream statistics.

pub mod costs;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod strategy;

pub use costs::{CommissionTier, CostError, CostModel, MarketCondition, TaxSchedule};
pub use data::{MarketDataSource, ReadAhead, VecSource};
pub use domain::{
    CostComponents, Instrument, InstrumentType, InvalidSignal, MarketBar, OrderRequest, OrderSide,
    Portfolio, Position, Signal, SignalKind, Transaction,
};
pub use engine::{
    ControlHandle, DroppedSignal, EngineConfig, EngineStatus, EquityPoint, Progress, RunOutcome,
    SimulationEngine,
};
pub use error::{ConfigError, DataError, EngineError, StrategyError};
pub use ledger::{PortfolioLedger, RejectReason, RiskLimits};
pub use strategy::Strategy;
