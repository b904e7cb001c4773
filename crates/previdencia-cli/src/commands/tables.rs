use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use previdencia_core::analysis::adjust::apply_overhead;
use previdencia_core::analysis::returns::filter_by_range;
use previdencia_core::benchmarks::simulator::simulate_for_display;
use previdencia_core::report::{contributions_table, position_table, BenchmarkTableSeries};
use previdencia_core::statement::rows::monthly_contributions;
use previdencia_core::types::{DateRange, Money};

use super::{load_series, load_statement, scope_for};

/// Arguments for the monthly position table
#[derive(Args)]
pub struct PositionTableArgs {
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

    /// Path to a deflator index series (JSON array of {date, value})
    #[arg(long)]
    pub deflator: Option<String>,

    /// Path to a benchmark index series (JSON array of {date, value})
    #[arg(long)]
    pub benchmark: Option<String>,

    /// Benchmark label for column headers
    #[arg(long, default_value = "benchmark")]
    pub benchmark_name: String,

    /// Annual overhead percentage stacked on the benchmark
    #[arg(long, default_value = "0")]
    pub overhead: Decimal,
}

pub fn run_position_table(args: PositionTableArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let statement = load_statement(&args.rows, args.scan.as_deref())?;
    let range = DateRange {
        start: args.start,
        end: args.end,
    };
    let scope = scope_for(args.participant_only);
    let view = filter_by_range(&statement.positions, &statement.records, &range);

    let deflator_index = args.deflator.as_deref().map(load_series).transpose()?;

    let benchmark = match args.benchmark.as_deref() {
        Some(path) => {
            let index = load_series(path)?;
            let flows: Vec<(NaiveDate, Money)> = view
                .contributions
                .iter()
                .map(|record| (record.date, scope.amount(record)))
                .collect();
            let position_dates: Vec<NaiveDate> =
                view.positions.iter().map(|point| point.date).collect();
            let starting_position = statement.starting_position();

            let simulated =
                simulate_for_display(&flows, starting_position, &index, &position_dates);
            let (simulated_overhead, index_overhead) = if args.overhead > Decimal::ZERO {
                let boosted = apply_overhead(&index, args.overhead);
                (
                    Some(simulate_for_display(
                        &flows,
                        starting_position,
                        &boosted,
                        &position_dates,
                    )),
                    Some(boosted),
                )
            } else {
                (None, None)
            };

            Some(BenchmarkTableSeries {
                label: args.benchmark_name.clone(),
                overhead_pct: args.overhead,
                simulated,
                simulated_overhead,
                index,
                index_overhead,
            })
        }
        None => None,
    };

    let rows = position_table(
        &view.positions,
        &view.contributions,
        scope,
        deflator_index.as_ref(),
        benchmark.as_ref(),
    );
    Ok(serde_json::to_value(rows)?)
}

/// Arguments for the monthly contributions table
#[derive(Args)]
pub struct ContributionsTableArgs {
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

    /// Show the participant/sponsor split
    #[arg(long)]
    pub participant_only: bool,

    /// Path to a deflator index series (JSON array of {date, value})
    #[arg(long)]
    pub deflator: Option<String>,
}

pub fn run_contributions_table(
    args: ContributionsTableArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let statement = load_statement(&args.rows, args.scan.as_deref())?;

    // Cumulative sums restart inside the window, so records are
    // filtered before the monthly rollup
    let (records, positions): (Vec<_>, Vec<_>) = match (args.start, args.end) {
        (Some(start), Some(end)) => (
            statement
                .records
                .iter()
                .filter(|r| {
                    let month = previdencia_core::calendar::month_end(r.date);
                    month >= start && month <= end
                })
                .cloned()
                .collect(),
            statement
                .positions
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .cloned()
                .collect(),
        ),
        _ => (statement.records.clone(), statement.positions.clone()),
    };
    let monthly = monthly_contributions(&records);

    let deflator_index = args.deflator.as_deref().map(load_series).transpose()?;

    let rows = contributions_table(
        &monthly,
        &positions,
        scope_for(args.participant_only),
        deflator_index.as_ref(),
    );
    Ok(serde_json::to_value(rows)?)
}
