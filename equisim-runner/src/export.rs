//! Artifact export — JSON results, CSV trade tape and equity curve.
//!
//! Persisted JSON carries a `schema_version` field; files written by a
//! newer layout are rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};

use equisim_core::{EquityPoint, Transaction};

use crate::result::{BacktestResult, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a result to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a result from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Transaction tape as CSV.
///
/// Columns: timestamp, symbol, side, quantity, fill_price, commission,
/// tax, slippage, total_cost, realized_pnl
pub fn export_transactions_csv(transactions: &[Transaction]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "symbol",
        "side",
        "quantity",
        "fill_price",
        "commission",
        "tax",
        "slippage",
        "total_cost",
        "realized_pnl",
    ])?;
    for tx in transactions {
        wtr.write_record([
            tx.timestamp.to_rfc3339(),
            tx.symbol.clone(),
            format!("{:?}", tx.side).to_uppercase(),
            tx.quantity.to_string(),
            tx.fill_price.to_string(),
            tx.costs.commission.to_string(),
            tx.costs.tax.to_string(),
            tx.costs.slippage.to_string(),
            tx.costs.total.to_string(),
            tx.realized_pnl.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }
    let bytes = wtr.into_inner().context("CSV writer flush failed")?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

/// Equity curve as CSV: timestamp, equity.
pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for point in curve {
        wtr.write_record([point.timestamp.to_rfc3339(), point.value.to_string()])?;
    }
    let bytes = wtr.into_inner().context("CSV writer flush failed")?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

/// Write the full artifact set (result JSON, trades CSV, equity CSV)
/// under `dir`, named by run id.
pub fn write_artifacts(result: &BacktestResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let stem = &result.run_id[..result.run_id.len().min(12)];
    std::fs::write(dir.join(format!("{stem}.json")), export_json(result)?)?;
    std::fs::write(
        dir.join(format!("{stem}_trades.csv")),
        export_transactions_csv(&result.transactions)?,
    )?;
    std::fs::write(
        dir.join(format!("{stem}_equity.csv")),
        export_equity_csv(&result.equity_curve)?,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use equisim_core::{CostComponents, EngineStatus, OrderSide};
    use rust_decimal_macros::dec;

    fn sample_result() -> BacktestResult {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        BacktestResult {
            schema_version: SCHEMA_VERSION,
            run_id: "deadbeefdeadbeef".into(),
            status: EngineStatus::Completed,
            bar_count: 1,
            duration_ms: 3,
            equity_curve: vec![EquityPoint {
                timestamp: ts,
                value: dec!(10000000),
            }],
            transactions: vec![Transaction {
                timestamp: ts,
                symbol: "005930".into(),
                side: OrderSide::Sell,
                quantity: 10,
                fill_price: dec!(70000),
                costs: CostComponents::new(dec!(1050), dec!(2100), dec!(700)),
                realized_pnl: Some(dec!(-3850)),
            }],
            dropped_signals: Vec::new(),
            report: None,
            error: None,
        }
    }

    #[test]
    fn json_round_trip() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.run_id, result.run_id);
        assert_eq!(back.transactions.len(), 1);
        assert_eq!(back.transactions[0].realized_pnl, Some(dec!(-3850)));
    }

    #[test]
    fn future_schema_rejected() {
        let mut result = sample_result();
        result.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&result).unwrap();
        assert!(import_json(&json).is_err());
    }

    #[test]
    fn transactions_csv_has_all_columns() {
        let csv = export_transactions_csv(&sample_result().transactions).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,symbol,side,quantity,fill_price,commission,tax,slippage,total_cost,realized_pnl"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("005930"));
        assert!(row.contains("SELL"));
        assert!(row.contains("-3850"));
    }

    #[test]
    fn artifacts_land_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result();
        write_artifacts(&result, dir.path()).unwrap();
        assert!(dir.path().join("deadbeefdead.json").exists());
        assert!(dir.path().join("deadbeefdead_trades.csv").exists());
        assert!(dir.path().join("deadbeefdead_equity.csv").exists());
    }
}
