pub mod benchmark;
pub mod solver;
pub mod statement;
pub mod tables;

use previdencia_core::series::ValueSeries;
use previdencia_core::statement::position::position_series;
use previdencia_core::statement::reconcile::{detect_from_scan, PartialMetadata};
use previdencia_core::statement::rows::{contribution_records, ContributionScope};
use previdencia_core::types::{
    ContributionRecord, PositionPoint, StatementScan, TransactionRow, ValuePoint,
};
use rust_decimal::Decimal;

use crate::input;

/// Load an index series from a JSON array of `{date, value}` points.
pub fn load_series(path: &str) -> Result<ValueSeries, Box<dyn std::error::Error>> {
    let points: Vec<ValuePoint> = input::read_json(path)?;
    Ok(ValueSeries::new(points))
}

/// A statement loaded from the extraction layer's JSON: rows plus the
/// optional balance scan, reconciled into series.
pub struct LoadedStatement {
    pub positions: Vec<PositionPoint>,
    pub records: Vec<ContributionRecord>,
    pub metadata: Option<PartialMetadata>,
}

impl LoadedStatement {
    pub fn missing_units(&self) -> Decimal {
        self.metadata
            .as_ref()
            .map(|meta| meta.effective_missing_units())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn starting_position(&self) -> Decimal {
        self.metadata
            .as_ref()
            .map(|meta| meta.effective_starting_position())
            .unwrap_or(Decimal::ZERO)
    }
}

pub fn load_statement(
    rows_path: &str,
    scan_path: Option<&str>,
) -> Result<LoadedStatement, Box<dyn std::error::Error>> {
    let rows: Vec<TransactionRow> = input::read_json(rows_path)?;

    let metadata = match scan_path {
        Some(path) => {
            let scan: StatementScan = input::read_json(path)?;
            detect_from_scan(&scan, &rows)
        }
        None => None,
    };
    let starting_units = metadata
        .as_ref()
        .map(|meta| meta.effective_missing_units())
        .unwrap_or(Decimal::ZERO);

    Ok(LoadedStatement {
        positions: position_series(&rows, starting_units),
        records: contribution_records(&rows),
        metadata,
    })
}

pub fn scope_for(participant_only: bool) -> ContributionScope {
    if participant_only {
        ContributionScope::ParticipantOnly
    } else {
        ContributionScope::Total
    }
}
