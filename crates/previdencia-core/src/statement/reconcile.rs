//! Partial-history reconciliation.
//!
//! A statement may cover only a trailing window of the account: the
//! reported SALDO TOTAL quota count then exceeds the sum of visible
//! transaction quotas. The difference is the invisible prefix, priced
//! in bulk at the first visible month's quota value. A complete
//! statement narrowed to a date window produces the same situation, and
//! both go through the same derivation so downstream figures cannot
//! drift between the two paths.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, StatementScan, TransactionRow, Units};

use super::position::{first_unit_value, visible_unit_sum};

/// Quota differences below this are floating/rounding noise, not
/// missing history.
pub const PARTIAL_THRESHOLD: Decimal = dec!(0.1);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialMetadata {
    pub is_partial: bool,
    pub missing_units: Units,
    /// Value of the invisible prefix at the first visible quota price.
    pub starting_position: Money,
    pub first_visible_month: NaiveDate,
}

impl PartialMetadata {
    /// Metadata for a statement with no invisible prefix.
    pub fn complete(first_visible_month: NaiveDate) -> Self {
        PartialMetadata {
            is_partial: false,
            missing_units: Decimal::ZERO,
            starting_position: Decimal::ZERO,
            first_visible_month,
        }
    }

    /// Missing units when the statement is partial, zero otherwise.
    pub fn effective_missing_units(&self) -> Units {
        if self.is_partial {
            self.missing_units
        } else {
            Decimal::ZERO
        }
    }

    /// Starting position when the statement is partial, zero otherwise.
    pub fn effective_starting_position(&self) -> Money {
        if self.is_partial {
            self.starting_position
        } else {
            Decimal::ZERO
        }
    }
}

/// Compare the reported quota total against the visible transaction sum
/// and derive the invisible prefix.
pub fn detect(
    reported_total_units: Units,
    visible_unit_total: Units,
    unit_value_at_first_visible_month: Decimal,
    first_visible_month: NaiveDate,
) -> PartialMetadata {
    let missing_units = reported_total_units - visible_unit_total;
    PartialMetadata {
        is_partial: missing_units > PARTIAL_THRESHOLD,
        missing_units,
        starting_position: missing_units * unit_value_at_first_visible_month,
        first_visible_month,
    }
}

/// `detect` fed from the statement's raw-text scan and parsed rows.
/// The profitability table's quota value for the first visible month is
/// preferred over the first row's; they differ only by intra-month
/// movement. `None` when the scan or the rows are unusable.
pub fn detect_from_scan(scan: &StatementScan, rows: &[TransactionRow]) -> Option<PartialMetadata> {
    let first_row = rows.first()?;
    let unit_value = scan
        .month_unit_values
        .get(&first_row.month_anchor)
        .copied()
        .or_else(|| first_unit_value(rows))?;
    Some(detect(
        scan.total_units,
        visible_unit_sum(rows),
        unit_value,
        first_row.month_anchor,
    ))
}

/// Missing-units equivalent for a complete statement narrowed to a
/// window: the position accumulated before the window start, re-priced
/// at the last quota value seen before the window. Zero when the
/// window keeps the whole history or the quota value is degenerate.
pub fn equivalent_missing_units(
    position_before_start: Money,
    unit_value_before_start: Decimal,
) -> Units {
    if position_before_start <= Decimal::ZERO || unit_value_before_start <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    position_before_start / unit_value_before_start
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_rounding_noise_is_complete() {
        let meta = detect(dec!(55555.15), dec!(55555.148), dec!(1.35), d(2023, 2, 1));
        assert!(!meta.is_partial);
        assert_eq!(meta.effective_missing_units(), Decimal::ZERO);
        assert_eq!(meta.effective_starting_position(), Decimal::ZERO);
    }

    #[test]
    fn test_missing_prefix_is_partial() {
        let meta = detect(dec!(55555.15), dec!(30000), dec!(1.35), d(2024, 7, 1));
        assert!(meta.is_partial);
        assert_eq!(meta.missing_units, dec!(25555.15));
        assert_eq!(meta.starting_position, dec!(25555.15) * dec!(1.35));
        assert_eq!(meta.first_visible_month, d(2024, 7, 1));
    }

    #[test]
    fn test_threshold_boundary() {
        let at = detect(dec!(1000.1), dec!(1000), dec!(1), d(2024, 1, 1));
        assert!(!at.is_partial);
        let above = detect(dec!(1000.11), dec!(1000), dec!(1), d(2024, 1, 1));
        assert!(above.is_partial);
    }

    #[test]
    fn test_negative_discrepancy_is_complete() {
        // Reported fewer quotas than visible: rounding artifact, not
        // missing history
        let meta = detect(dec!(999.5), dec!(1000), dec!(1), d(2024, 1, 1));
        assert!(!meta.is_partial);
    }

    #[test]
    fn test_equivalent_missing_units_matches_direct_detection() {
        // A prefix of 25_000 quotas worth 1.35 each, seen either as a
        // reported-total discrepancy or as a pre-window position, must
        // reconcile to the same unit count
        let prefix_units = dec!(25000);
        let unit_value = dec!(1.35);

        let direct = detect(
            dec!(30000) + prefix_units,
            dec!(30000),
            unit_value,
            d(2024, 7, 1),
        );
        let from_filter = equivalent_missing_units(prefix_units * unit_value, unit_value);

        assert_eq!(direct.missing_units, from_filter);
    }

    #[test]
    fn test_scan_prefers_profitability_table_quota_value() {
        use crate::types::{ContributionKind, StatementScan, TransactionRow};

        let rows = vec![TransactionRow {
            month_anchor: d(2024, 7, 1),
            exact_date: d(2024, 7, 15),
            unit_value: dec!(1.36),
            units_delta: dec!(100),
            is_contribution: true,
            kind: ContributionKind::Participant,
        }];
        let mut scan = StatementScan {
            total_units: dec!(1100),
            total_balance: dec!(1496),
            month_unit_values: Default::default(),
        };

        // Without the table, the first row's quota value prices the prefix
        let meta = detect_from_scan(&scan, &rows).unwrap();
        assert_eq!(meta.starting_position, dec!(1000) * dec!(1.36));

        scan.month_unit_values.insert(d(2024, 7, 1), dec!(1.34));
        let meta = detect_from_scan(&scan, &rows).unwrap();
        assert_eq!(meta.starting_position, dec!(1000) * dec!(1.34));
        assert_eq!(detect_from_scan(&scan, &[]), None);
    }

    #[test]
    fn test_equivalent_missing_units_degenerate_inputs() {
        assert_eq!(equivalent_missing_units(dec!(0), dec!(1.35)), dec!(0));
        assert_eq!(equivalent_missing_units(dec!(1000), dec!(0)), dec!(0));
    }
}
