//! The assembled output of one backtest run.

use serde::{Deserialize, Serialize};

use equisim_core::{DroppedSignal, EngineStatus, EquityPoint, Transaction};

use crate::config::RunId;
use crate::metrics::PerformanceReport;

/// Bumped whenever the persisted result layout changes shape.
pub const SCHEMA_VERSION: u32 = 1;

fn current_schema() -> u32 {
    SCHEMA_VERSION
}

/// Everything a run produced, in one serializable bundle.
///
/// `Failed` results carry the error text and whatever artifacts had
/// accumulated before the failure; `Cancelled` results are valid
/// partial runs and still get a report when any bars were processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "current_schema")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub status: EngineStatus,
    pub bar_count: usize,
    /// Wall-clock run time.
    #[serde(default)]
    pub duration_ms: u64,
    pub equity_curve: Vec<EquityPoint>,
    pub transactions: Vec<Transaction>,
    pub dropped_signals: Vec<DroppedSignal>,
    pub report: Option<PerformanceReport>,
    pub error: Option<String>,
}

impl BacktestResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, EngineStatus::Completed)
    }
}
