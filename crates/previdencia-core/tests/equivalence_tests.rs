//! Filtering a complete statement to a window must produce the same
//! figures as loading a statement that only covers that window.
//!
//! One underlying account history is viewed three ways: the full
//! statement filtered, a one-year statement filtered, and a genuinely
//! partial statement taken whole. All paths must agree on the displayed
//! invested total and CAGR.

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use previdencia_core::analysis::returns::window_statistics;
use previdencia_core::statement::position::position_series;
use previdencia_core::statement::reconcile::detect_from_scan;
use previdencia_core::statement::rows::{contribution_records, ContributionScope};
use previdencia_core::types::{
    ContributionKind, DateRange, PositionPoint, StatementScan, TransactionRow,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Every month from Feb 2023 to Nov 2025: a participant deposit, a
/// sponsor deposit, and an administration fee, against a quota growing
/// 0.8% per month.
fn full_history() -> Vec<TransactionRow> {
    let mut rows = Vec::new();
    let mut months = Vec::new();
    for year in 2023..=2025 {
        for month in 1..=12u32 {
            if (year == 2023 && month < 2) || (year == 2025 && month > 11) {
                continue;
            }
            months.push((year, month));
        }
    }

    for (i, (year, month)) in months.into_iter().enumerate() {
        let unit_value = dec!(1.30) * dec!(1.008).powi(i as i64);
        let anchor = d(year, month, 1);
        rows.push(TransactionRow {
            month_anchor: anchor,
            exact_date: d(year, month, 15),
            unit_value,
            units_delta: dec!(500) / unit_value,
            is_contribution: true,
            kind: ContributionKind::Participant,
        });
        rows.push(TransactionRow {
            month_anchor: anchor,
            exact_date: d(year, month, 15),
            unit_value,
            units_delta: dec!(500) / unit_value,
            is_contribution: true,
            kind: ContributionKind::Sponsor,
        });
        rows.push(TransactionRow {
            month_anchor: anchor,
            exact_date: d(year, month, 20),
            unit_value,
            units_delta: dec!(-0.8),
            is_contribution: false,
            kind: ContributionKind::Participant,
        });
    }
    rows
}

fn units_through(rows: &[TransactionRow], end: NaiveDate) -> Decimal {
    rows.iter()
        .filter(|row| row.exact_date <= end)
        .map(|row| row.units_delta)
        .sum()
}

/// A statement covering `start..=end`, with the SALDO TOTAL the fund
/// would print at the statement's end.
fn statement_view(
    full: &[TransactionRow],
    start: NaiveDate,
    end: NaiveDate,
) -> (Vec<TransactionRow>, StatementScan) {
    let rows: Vec<TransactionRow> = full
        .iter()
        .filter(|row| row.exact_date >= start && row.exact_date <= end)
        .cloned()
        .collect();
    let total_units = units_through(full, end);
    let last_unit_value = rows.last().map(|r| r.unit_value).unwrap_or(Decimal::ONE);
    let scan = StatementScan {
        total_units,
        total_balance: total_units * last_unit_value,
        month_unit_values: Default::default(),
    };
    (rows, scan)
}

struct LoadedStatement {
    positions: Vec<PositionPoint>,
    records: Vec<previdencia_core::types::ContributionRecord>,
    missing_units: Decimal,
}

fn load(rows: Vec<TransactionRow>, scan: StatementScan) -> LoadedStatement {
    let meta = detect_from_scan(&scan, &rows).expect("rows present");
    let missing_units = meta.effective_missing_units();
    LoadedStatement {
        positions: position_series(&rows, missing_units),
        records: contribution_records(&rows),
        missing_units,
    }
}

fn stats_for(
    statement: &LoadedStatement,
    range: &DateRange,
) -> previdencia_core::analysis::returns::WindowStatistics {
    window_statistics(
        &statement.positions,
        &statement.records,
        range,
        ContributionScope::Total,
        statement.missing_units,
    )
    .result
}

#[test]
fn test_full_statement_is_detected_complete() {
    let full = full_history();
    let (rows, scan) = statement_view(&full, d(2023, 2, 1), d(2025, 11, 30));
    let meta = detect_from_scan(&scan, &rows).unwrap();
    assert!(!meta.is_partial);
}

#[test]
fn test_trailing_statement_is_detected_partial() {
    let full = full_history();
    let (rows, scan) = statement_view(&full, d(2024, 7, 1), d(2024, 12, 31));
    let meta = detect_from_scan(&scan, &rows).unwrap();
    assert!(meta.is_partial);
    let expected_missing = units_through(&full, d(2024, 6, 30));
    assert!((meta.missing_units - expected_missing).abs() < dec!(0.0000001));
}

#[test]
fn test_full_filtered_to_year_matches_year_statement() {
    let full = full_history();
    let (full_rows, full_scan) = statement_view(&full, d(2023, 2, 1), d(2025, 11, 30));
    let (year_rows, year_scan) = statement_view(&full, d(2024, 1, 1), d(2024, 12, 31));

    let full_statement = load(full_rows, full_scan);
    let year_statement = load(year_rows, year_scan);

    let range = DateRange::new(d(2024, 1, 31), d(2024, 12, 31));
    let filtered = stats_for(&full_statement, &range);
    let direct = stats_for(&year_statement, &range);

    assert_eq!(filtered.invested_text, direct.invested_text);
    assert_eq!(filtered.cagr_text, direct.cagr_text);
}

#[test]
fn test_all_three_paths_agree_on_trailing_window() {
    let full = full_history();
    let (full_rows, full_scan) = statement_view(&full, d(2023, 2, 1), d(2025, 11, 30));
    let (year_rows, year_scan) = statement_view(&full, d(2024, 1, 1), d(2024, 12, 31));
    let (partial_rows, partial_scan) = statement_view(&full, d(2024, 7, 1), d(2024, 12, 31));

    let full_statement = load(full_rows, full_scan);
    let year_statement = load(year_rows, year_scan);
    let partial_statement = load(partial_rows, partial_scan);

    let range = DateRange::new(d(2024, 7, 31), d(2024, 12, 31));
    let path_full = stats_for(&full_statement, &range);
    let path_year = stats_for(&year_statement, &range);
    let path_partial = stats_for(&partial_statement, &range);

    assert_eq!(path_full.invested_text, path_year.invested_text);
    assert_eq!(path_year.invested_text, path_partial.invested_text);

    assert_eq!(path_full.cagr_text, path_year.cagr_text);
    assert_eq!(path_year.cagr_text, path_partial.cagr_text);

    // The true total shown on the card is the same account in all paths
    assert_eq!(path_full.position_text, path_year.position_text);
    assert_eq!(path_year.position_text, path_partial.position_text);
}

#[test]
fn test_participant_scope_agrees_across_paths() {
    let full = full_history();
    let (full_rows, full_scan) = statement_view(&full, d(2023, 2, 1), d(2025, 11, 30));
    let (partial_rows, partial_scan) = statement_view(&full, d(2024, 7, 1), d(2024, 12, 31));

    let full_statement = load(full_rows, full_scan);
    let partial_statement = load(partial_rows, partial_scan);

    let range = DateRange::new(d(2024, 7, 31), d(2024, 12, 31));
    let scoped = |statement: &LoadedStatement| {
        window_statistics(
            &statement.positions,
            &statement.records,
            &range,
            ContributionScope::ParticipantOnly,
            statement.missing_units,
        )
        .result
    };

    let path_full = scoped(&full_statement);
    let path_partial = scoped(&partial_statement);

    assert_eq!(path_full.invested_text, path_partial.invested_text);
    assert_eq!(path_full.cagr_text, path_partial.cagr_text);
    // Six months of 500/month from the participant
    assert_eq!(path_full.invested_text, "R$ 3.000,00");
}
