//! Monthly position series from the running quota balance.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar::month_end;
use crate::types::{PositionPoint, TransactionRow, Units};

/// Derive the month-end position series from statement rows.
///
/// Quota deltas accumulate in statement order on top of
/// `starting_units` (the invisible prefix of a partial statement; zero
/// for a complete one). Within each month the last row wins, priced at
/// that row's quota value, and the point is dated at month-end.
pub fn position_series(rows: &[TransactionRow], starting_units: Units) -> Vec<PositionPoint> {
    let mut cumulative = starting_units;
    let mut by_month: BTreeMap<NaiveDate, PositionPoint> = BTreeMap::new();

    for row in rows {
        cumulative += row.units_delta;
        by_month.insert(
            row.month_anchor,
            PositionPoint {
                date: month_end(row.month_anchor),
                cumulative_units: cumulative,
                unit_value: row.unit_value,
                position: cumulative * row.unit_value,
            },
        );
    }

    by_month.into_values().collect()
}

/// Sum of quota deltas over all rows (contributions and fees alike).
pub fn visible_unit_sum(rows: &[TransactionRow]) -> Units {
    rows.iter().map(|row| row.units_delta).sum()
}

/// Quota value of the first row, used to price a partial statement's
/// invisible prefix.
pub fn first_unit_value(rows: &[TransactionRow]) -> Option<Decimal> {
    rows.first().map(|row| row.unit_value)
}
