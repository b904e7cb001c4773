use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use previdencia_core::analysis::adjust::{deflate_contributions, deflate_positions};
use previdencia_core::analysis::returns::{summary_statistics, window_statistics};
use previdencia_core::types::DateRange;

use super::{load_series, load_statement, scope_for};

/// Arguments for the whole-statement summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to the parsed transaction rows (JSON array)
    #[arg(long)]
    pub rows: String,

    /// Path to the balance-section scan (JSON), for partial detection
    #[arg(long)]
    pub scan: Option<String>,
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let statement = load_statement(&args.rows, args.scan.as_deref())?;
    let result = summary_statistics(&statement.positions, &statement.records);
    Ok(serde_json::to_value(result)?)
}

/// Arguments for window statistics
#[derive(Args)]
pub struct WindowArgs {
    /// Path to the parsed transaction rows (JSON array)
    #[arg(long)]
    pub rows: String,

    /// Path to the balance-section scan (JSON), for partial detection
    #[arg(long)]
    pub scan: Option<String>,

    /// Window start (YYYY-MM-DD); both bounds required to filter
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Window end (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Count only participant money as invested
    #[arg(long)]
    pub participant_only: bool,

    /// Path to a deflator index series for real values
    #[arg(long)]
    pub deflator: Option<String>,

    /// Reference date for real values (YYYY-MM-DD)
    #[arg(long)]
    pub reference: Option<NaiveDate>,
}

pub fn run_window(args: WindowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let statement = load_statement(&args.rows, args.scan.as_deref())?;

    // Real-value mode restates both series before any statistics run
    let (positions, records) = match (args.deflator.as_deref(), args.reference) {
        (Some(path), Some(reference)) => {
            let index = load_series(path)?;
            (
                deflate_positions(&statement.positions, &index, reference),
                deflate_contributions(&statement.records, &index, reference),
            )
        }
        _ => (statement.positions.clone(), statement.records.clone()),
    };

    let range = DateRange {
        start: args.start,
        end: args.end,
    };
    let result = window_statistics(
        &positions,
        &records,
        &range,
        scope_for(args.participant_only),
        statement.missing_units(),
    );
    Ok(serde_json::to_value(result)?)
}
