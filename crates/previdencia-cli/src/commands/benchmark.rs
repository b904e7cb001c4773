use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use previdencia_core::analysis::returns::filter_by_range;
use previdencia_core::benchmarks::simulator::{compare, ComparisonInput};
use previdencia_core::types::{DateRange, Money};

use super::{load_series, load_statement, scope_for};

/// Arguments for a benchmark comparison
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to the parsed transaction rows (JSON array)
    #[arg(long)]
    pub rows: String,

    /// Path to the balance-section scan (JSON), for partial detection
    #[arg(long)]
    pub scan: Option<String>,

    /// Path to the benchmark index series (JSON array of {date, value})
    #[arg(long)]
    pub benchmark: String,

    /// Benchmark label ("CDI", "IPCA", ...)
    #[arg(long, default_value = "benchmark")]
    pub benchmark_name: String,

    /// Annual overhead percentage stacked on the benchmark
    #[arg(long, default_value = "0")]
    pub overhead: Decimal,

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

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let statement = load_statement(&args.rows, args.scan.as_deref())?;
    let scope = scope_for(args.participant_only);
    let range = DateRange {
        start: args.start,
        end: args.end,
    };
    let view = filter_by_range(&statement.positions, &statement.records, &range);

    let benchmark = load_series(&args.benchmark)?;
    let deflator = args.deflator.as_deref().map(load_series).transpose()?;

    let flows: Vec<(NaiveDate, Money)> = view
        .contributions
        .iter()
        .map(|record| (record.date, scope.amount(record)))
        .collect();
    let position_dates: Vec<NaiveDate> = view.positions.iter().map(|point| point.date).collect();

    let comparison = compare(&ComparisonInput {
        contributions: &flows,
        position_dates: &position_dates,
        benchmark: &benchmark,
        benchmark_label: &args.benchmark_name,
        overhead_pct: args.overhead,
        starting_position: statement.starting_position(),
        inflation: deflator.as_ref(),
        inflation_reference: args.reference,
    });

    Ok(serde_json::to_value(comparison)?)
}
