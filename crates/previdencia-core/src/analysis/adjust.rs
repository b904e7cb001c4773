//! Overhead and deflation transformers.
//!
//! Both share the solver's day-count convention: elapsed business days
//! are approximated from calendar days by 252/365, so an X% overhead
//! applied to an inflation index and then deflated by that same index
//! nets out to exactly X% real annual growth. All transforms return new
//! series; source series are never mutated.

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::series::ValueSeries;
use crate::solver::{BUSINESS_DAYS_PER_YEAR, CALENDAR_DAYS_PER_YEAR};
use crate::types::{ContributionRecord, PositionPoint, ValuePoint};

/// Compound `annual_pct` percent per year onto every point of `series`,
/// measured in approximate business days from the series start. The
/// first point is unchanged; zero overhead returns a copy.
pub fn apply_overhead(series: &ValueSeries, annual_pct: Decimal) -> ValueSeries {
    if annual_pct.is_zero() || series.is_empty() {
        return series.clone();
    }
    let start = series.first().expect("non-empty").date;
    let growth = Decimal::ONE + annual_pct / dec!(100);

    let points = series
        .points()
        .iter()
        .map(|point| {
            let calendar_days = Decimal::from((point.date - start).num_days());
            let biz_days = calendar_days * BUSINESS_DAYS_PER_YEAR / CALENDAR_DAYS_PER_YEAR;
            let factor = growth
                .checked_powd(biz_days / BUSINESS_DAYS_PER_YEAR)
                .unwrap_or(Decimal::ONE);
            ValuePoint {
                date: point.date,
                value: point.value * factor,
            }
        })
        .collect();
    ValueSeries::new(points)
}

/// Deflator for `date` against `reference_date`: the ratio of resampled
/// index values. `None` when the index cannot be resampled at either
/// date.
pub fn deflator_at(
    inflation: &ValueSeries,
    date: NaiveDate,
    reference_date: NaiveDate,
) -> Option<Decimal> {
    let (base, _) = inflation.value_at(reference_date, None);
    let base = base?;
    let (at_date, _) = inflation.value_at(date, None);
    match at_date {
        Some(v) if v > Decimal::ZERO => Some(base / v),
        _ => None,
    }
}

/// Convert nominal values to `reference_date` purchasing power. Points
/// the index cannot cover keep their nominal value; an index with no
/// value at the reference date leaves the whole series unchanged.
pub fn deflate(
    values: &[ValuePoint],
    inflation: &ValueSeries,
    reference_date: NaiveDate,
) -> Vec<ValuePoint> {
    let (base, _) = inflation.value_at(reference_date, None);
    if base.is_none() {
        return values.to_vec();
    }

    values
        .iter()
        .map(|point| ValuePoint {
            date: point.date,
            value: match deflator_at(inflation, point.date, reference_date) {
                Some(deflator) => point.value * deflator,
                None => point.value,
            },
        })
        .collect()
}

/// Deflate a position series: both the position and the quota value are
/// converted (the quota value feeds partial-statement CAGR figures).
pub fn deflate_positions(
    points: &[PositionPoint],
    inflation: &ValueSeries,
    reference_date: NaiveDate,
) -> Vec<PositionPoint> {
    points
        .iter()
        .map(|point| match deflator_at(inflation, point.date, reference_date) {
            Some(deflator) => PositionPoint {
                date: point.date,
                cumulative_units: point.cumulative_units,
                unit_value: point.unit_value * deflator,
                position: point.position * deflator,
            },
            None => point.clone(),
        })
        .collect()
}

/// Deflate contribution records at their exact dates and rebuild the
/// running cumulative sums from the deflated amounts.
pub fn deflate_contributions(
    records: &[ContributionRecord],
    inflation: &ValueSeries,
    reference_date: NaiveDate,
) -> Vec<ContributionRecord> {
    let mut cumulative_participant = Decimal::ZERO;
    let mut cumulative_sponsor = Decimal::ZERO;

    records
        .iter()
        .map(|record| {
            let deflator =
                deflator_at(inflation, record.date, reference_date).unwrap_or(Decimal::ONE);
            let participant = record.participant * deflator;
            let sponsor = record.sponsor * deflator;
            cumulative_participant += participant;
            cumulative_sponsor += sponsor;
            ContributionRecord {
                date: record.date,
                month_anchor: record.month_anchor,
                participant,
                sponsor,
                total: participant + sponsor,
                cumulative_participant,
                cumulative_sponsor,
                cumulative_total: cumulative_participant + cumulative_sponsor,
            }
        })
        .collect()
}
