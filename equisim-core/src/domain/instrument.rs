//! Instrument metadata: tax class and sector membership.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Tax class of a listed instrument. Sell-side transaction tax differs
/// per class; buys are never taxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentType {
    Equity,
    Etf,
    Reit,
}

impl InstrumentType {
    /// Default sell-side tax rate for the class.
    pub fn default_tax_rate(self) -> Decimal {
        match self {
            InstrumentType::Equity => dec!(0.003),
            InstrumentType::Etf => dec!(0.0008),
            InstrumentType::Reit => dec!(0.0035),
        }
    }
}

/// Per-symbol metadata consulted by the ledger for tax and sector
/// concentration checks. Symbols without an entry are treated as plain
/// equities with no sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub instrument_type: InstrumentType,
    pub sector: Option<String>,
}

impl Instrument {
    pub fn equity(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            instrument_type: InstrumentType::Equity,
            sector: None,
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_rates_differ_per_class() {
        assert_eq!(InstrumentType::Equity.default_tax_rate(), dec!(0.003));
        assert_eq!(InstrumentType::Etf.default_tax_rate(), dec!(0.0008));
        assert_eq!(InstrumentType::Reit.default_tax_rate(), dec!(0.0035));
    }

    #[test]
    fn builder_sets_sector() {
        let inst = Instrument::equity("005930").with_sector("semiconductors");
        assert_eq!(inst.sector.as_deref(), Some("semiconductors"));
        assert_eq!(inst.instrument_type, InstrumentType::Equity);
    }
}
