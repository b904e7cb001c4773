//! Counterfactual benchmark investment via unit accounting.
//!
//! Each contribution buys benchmark "units" at the resampled index
//! value on its date; holdings are marked at each valuation date. The
//! two entry points differ in what they hold: the display curve starts
//! from the account's true total (a partial statement's starting
//! position is replayed as a synthetic first contribution), while the
//! attribution run holds visible contributions only, so the benchmark
//! CAGR measures the same money as the account's own CAGR.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::analysis::adjust::{apply_overhead, deflate};
use crate::calendar::month_start;
use crate::report::{format_currency, format_percentage};
use crate::series::ValueSeries;
use crate::solver::solve_rate;
use crate::types::{Money, ValuePoint};

/// Replay `contributions` into `benchmark`, valuing holdings at each of
/// `valuation_dates`.
///
/// Contributions and valuation dates are swept in ascending date order;
/// each contribution applies once, at the first valuation date on or
/// after it. A contribution the benchmark has no (positive) value for
/// is skipped; a valuation date the benchmark has no value for reports
/// zero. Output follows ascending valuation-date order.
pub fn simulate(
    contributions: &[(NaiveDate, Money)],
    benchmark: &ValueSeries,
    valuation_dates: &[NaiveDate],
) -> Vec<ValuePoint> {
    let mut contributions: Vec<(NaiveDate, Money)> = contributions.to_vec();
    contributions.sort_by_key(|(date, _)| *date);
    let mut valuation_dates: Vec<NaiveDate> = valuation_dates.to_vec();
    valuation_dates.sort();

    let mut units_held = Decimal::ZERO;
    let mut next_contribution = 0;
    let mut results = Vec::with_capacity(valuation_dates.len());

    for valuation_date in valuation_dates {
        while next_contribution < contributions.len() {
            let (date, amount) = contributions[next_contribution];
            if date > valuation_date {
                break;
            }
            if let (Some(value), _) = benchmark.value_at(date, None) {
                if value > Decimal::ZERO {
                    units_held += amount / value;
                }
            }
            next_contribution += 1;
        }

        let position = match benchmark.value_at(valuation_date, None) {
            (Some(value), _) => units_held * value,
            (None, _) => Decimal::ZERO,
        };
        results.push(ValuePoint {
            date: valuation_date,
            value: position,
        });
    }
    results
}

/// Valuation dates for a simulation: the position dates from the first
/// contribution's month onward.
pub fn valuation_dates(
    position_dates: &[NaiveDate],
    contributions: &[(NaiveDate, Money)],
) -> Vec<NaiveDate> {
    let first_month = match contributions.iter().map(|(date, _)| *date).min() {
        Some(date) => month_start(date),
        None => return position_dates.to_vec(),
    };
    position_dates
        .iter()
        .copied()
        .filter(|date| month_start(*date) >= first_month)
        .collect()
}

/// Simulation backing the position chart: starts from the true total by
/// replaying a partial statement's starting position as a synthetic
/// contribution at the first position date.
pub fn simulate_for_display(
    contributions: &[(NaiveDate, Money)],
    starting_position: Money,
    benchmark: &ValueSeries,
    position_dates: &[NaiveDate],
) -> Vec<ValuePoint> {
    let mut flows = contributions.to_vec();
    if starting_position > Decimal::ZERO {
        if let Some(first_date) = position_dates.iter().min() {
            flows.insert(0, (*first_date, starting_position));
        }
    }
    let dates = valuation_dates(position_dates, &flows);
    simulate(&flows, benchmark, &dates)
}

/// Simulation backing the benchmark CAGR: visible contributions only,
/// so growth is attributed to the same money the account's own figures
/// measure.
pub fn simulate_for_attribution(
    contributions: &[(NaiveDate, Money)],
    benchmark: &ValueSeries,
    position_dates: &[NaiveDate],
) -> Vec<ValuePoint> {
    let dates = valuation_dates(position_dates, contributions);
    simulate(contributions, benchmark, &dates)
}

/// Inputs for a full benchmark comparison.
pub struct ComparisonInput<'a> {
    /// Visible contributions in the active window, already scoped.
    pub contributions: &'a [(NaiveDate, Money)],
    /// Position dates of the active window.
    pub position_dates: &'a [NaiveDate],
    /// Raw fetched benchmark series.
    pub benchmark: &'a ValueSeries,
    pub benchmark_label: &'a str,
    /// Annual overhead percentage stacked on the benchmark.
    pub overhead_pct: Decimal,
    /// A partial statement's invisible-prefix value; zero otherwise.
    pub starting_position: Money,
    /// Deflator index when real values are requested.
    pub inflation: Option<&'a ValueSeries>,
    pub inflation_reference: Option<NaiveDate>,
}

/// A benchmark comparison ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// "CDI" or "CDI +2%" with a nonzero overhead.
    pub label: String,
    /// Simulated positions for the chart (starts from the true total).
    pub display_series: Vec<ValuePoint>,
    /// Final simulated position of the display curve.
    pub final_position: Money,
    /// Annualized return of visible money in the benchmark, percent.
    pub cagr_pct: Option<Decimal>,
    pub cagr_text: String,
    pub position_text: String,
}

/// Simulate a benchmark against the account window and compute its
/// headline figures. Degenerate inputs (no contributions, no position
/// dates, empty benchmark) yield an empty comparison rather than an
/// error.
pub fn compare(input: &ComparisonInput<'_>) -> BenchmarkComparison {
    let label = if input.overhead_pct > Decimal::ZERO {
        format!("{} +{}%", input.benchmark_label, input.overhead_pct)
    } else {
        input.benchmark_label.to_string()
    };

    if input.contributions.is_empty() || input.position_dates.is_empty() {
        return BenchmarkComparison {
            label,
            display_series: Vec::new(),
            final_position: Decimal::ZERO,
            cagr_pct: None,
            cagr_text: "N/A".to_string(),
            position_text: String::new(),
        };
    }

    let boosted = apply_overhead(input.benchmark, input.overhead_pct);

    let mut display_series = simulate_for_display(
        input.contributions,
        input.starting_position,
        &boosted,
        input.position_dates,
    );
    let mut attribution_series = if input.starting_position > Decimal::ZERO {
        simulate_for_attribution(input.contributions, &boosted, input.position_dates)
    } else {
        display_series.clone()
    };

    if let (Some(inflation), Some(reference)) = (input.inflation, input.inflation_reference) {
        display_series = deflate(&display_series, inflation, reference);
        attribution_series = deflate(&attribution_series, inflation, reference);
    }

    let final_position = display_series
        .last()
        .map(|point| point.value)
        .unwrap_or(Decimal::ZERO);
    let attribution_final = attribution_series
        .last()
        .map(|point| point.value)
        .unwrap_or(Decimal::ZERO);

    let cagr_pct = attribution_series.last().and_then(|last| {
        let mut dates: Vec<NaiveDate> = input.contributions.iter().map(|(d, _)| *d).collect();
        let mut amounts: Vec<Money> = input.contributions.iter().map(|(_, a)| -a).collect();
        dates.push(last.date);
        amounts.push(attribution_final);
        solve_rate(&dates, &amounts).map(|rate| rate * dec!(100))
    });

    BenchmarkComparison {
        cagr_text: cagr_pct
            .map(|pct| format_percentage(pct, true))
            .unwrap_or_else(|| "N/A".to_string()),
        position_text: format!("Posição {}: {}", label, format_currency(final_position)),
        label,
        display_series,
        final_position,
        cagr_pct,
    }
}
