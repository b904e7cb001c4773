use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%) unless a field says `_pct`.
pub type Rate = Decimal;

/// Fund quota counts.
pub type Units = Decimal;

/// Who paid a contribution into the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    Participant,
    Sponsor,
}

/// One parsed statement line, as delivered by the PDF-extraction layer.
///
/// `units_delta` may be negative (administration fees); contribution rows
/// always carry a positive delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    /// Month the statement groups this line under (first day of month).
    pub month_anchor: NaiveDate,
    /// Exact movement date. Falls back to the month anchor when the
    /// statement omits it.
    pub exact_date: NaiveDate,
    pub unit_value: Decimal,
    pub units_delta: Units,
    pub is_contribution: bool,
    pub kind: ContributionKind,
}

/// Month-end account position derived from the running unit balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionPoint {
    /// Month-end date.
    pub date: NaiveDate,
    pub cumulative_units: Units,
    pub unit_value: Decimal,
    pub position: Money,
}

/// Contributions aggregated by exact date, with the participant/sponsor
/// split and running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub date: NaiveDate,
    pub month_anchor: NaiveDate,
    pub participant: Money,
    pub sponsor: Money,
    pub total: Money,
    pub cumulative_participant: Money,
    pub cumulative_sponsor: Money,
    pub cumulative_total: Money,
}

/// Raw totals scanned from the statement's balance and profitability
/// sections by the text-extraction layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementScan {
    /// Reported total quota count (SALDO TOTAL line).
    pub total_units: Units,
    /// Reported total balance in BRL.
    pub total_balance: Money,
    /// Month anchor -> quota value, from the profitability table.
    #[serde(default)]
    pub month_unit_values: BTreeMap<NaiveDate, Decimal>,
}

/// A single dated observation in an external index series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// View-time date window. `None` bounds leave that side open.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }

    /// An unbounded range (the whole statement).
    pub fn full() -> Self {
        DateRange::default()
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
