//! Domain types: bars, signals, orders, transactions, positions,
//! portfolio, instruments.

pub mod bar;
pub mod instrument;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod transaction;

pub use bar::MarketBar;
pub use instrument::{Instrument, InstrumentType};
pub use order::{OrderRequest, OrderSide};
pub use portfolio::Portfolio;
pub use position::Position;
pub use signal::{InvalidSignal, Signal, SignalKind};
pub use transaction::{CostComponents, Transaction};
