//! Sparse value series with geometric resampling.
//!
//! Benchmark and inflation indices arrive as irregular dated points.
//! `value_at` answers "what was / would be the index on date D":
//! geometric interpolation between stored points, geometric
//! extrapolation past the last point using an annual rate (supplied, or
//! derived from the historical endpoints). Forward business days are
//! approximated from calendar days by 252/365; no holiday calendar is
//! consulted for future dates.

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::solver::{BUSINESS_DAYS_PER_YEAR, CALENDAR_DAYS_PER_YEAR};
use crate::types::ValuePoint;

/// A date-sorted, date-deduplicated index series.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValueSeries {
    points: Vec<ValuePoint>,
}

impl ValueSeries {
    /// Build a series from arbitrary-ordered points. Points are sorted
    /// by date; the last value wins on duplicate dates.
    pub fn new(mut points: Vec<ValuePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        points.dedup_by(|next, prev| {
            if next.date == prev.date {
                prev.value = next.value;
                true
            } else {
                false
            }
        });
        ValueSeries { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[ValuePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&ValuePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ValuePoint> {
        self.points.last()
    }

    /// Index value on `target`, resampled.
    ///
    /// Returns `(value, reference_date)`. The reference date is `target`
    /// for stored and interpolated values, and the *last stored date*
    /// for extrapolated values — callers doing date bookkeeping rely on
    /// that distinction. `(None, None)` when the series is empty or
    /// `target` predates it.
    ///
    /// `extrapolation_annual_pct` overrides the historical-endpoint
    /// growth rate (in percent per year) used past the last point.
    pub fn value_at(
        &self,
        target: NaiveDate,
        extrapolation_annual_pct: Option<Decimal>,
    ) -> (Option<Decimal>, Option<NaiveDate>) {
        let first = match self.points.first() {
            Some(p) => p,
            None => return (None, None),
        };
        if target < first.date {
            return (None, None);
        }

        let last = self.points.last().expect("non-empty");
        if target > last.date {
            let annual_pct = extrapolation_annual_pct
                .unwrap_or_else(|| self.historical_annual_rate_pct());
            return (
                Some(extrapolate(last.value, last.date, target, annual_pct)),
                Some(last.date),
            );
        }

        match self.points.binary_search_by_key(&target, |p| p.date) {
            Ok(idx) => (Some(self.points[idx].value), Some(target)),
            Err(idx) => {
                // idx >= 1 because target is after the first point
                let prev = &self.points[idx - 1];
                let next = &self.points[idx];
                (Some(interpolate(prev, next, target)), Some(target))
            }
        }
    }

    /// Annualized growth between the series endpoints, in percent,
    /// over a calendar-day/365 year fraction. Zero for degenerate
    /// series (single point, non-positive values, zero span).
    fn historical_annual_rate_pct(&self) -> Decimal {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) if f.date < l.date => (f, l),
            _ => return Decimal::ZERO,
        };
        if first.value <= Decimal::ZERO || last.value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let years = Decimal::from((last.date - first.date).num_days()) / CALENDAR_DAYS_PER_YEAR;
        if years.is_zero() {
            return Decimal::ZERO;
        }
        let growth = (last.value / first.value)
            .checked_powd(Decimal::ONE / years)
            .unwrap_or(Decimal::ONE);
        (growth - Decimal::ONE) * dec!(100)
    }
}

/// Geometric interpolation: `prev * (next/prev)^fraction` with a
/// calendar-day fraction of the gap.
fn interpolate(prev: &ValuePoint, next: &ValuePoint, target: NaiveDate) -> Decimal {
    let gap = Decimal::from((next.date - prev.date).num_days());
    if gap.is_zero() || prev.value <= Decimal::ZERO || next.value <= Decimal::ZERO {
        return prev.value;
    }
    let fraction = Decimal::from((target - prev.date).num_days()) / gap;
    let ratio = next.value / prev.value;
    match ratio.checked_powd(fraction) {
        Some(factor) => prev.value * factor,
        None => prev.value,
    }
}

/// Geometric extrapolation at `annual_pct` percent per year over
/// approximate business days (calendar days * 252/365).
fn extrapolate(
    last_value: Decimal,
    last_date: NaiveDate,
    target: NaiveDate,
    annual_pct: Decimal,
) -> Decimal {
    let calendar_days = Decimal::from((target - last_date).num_days());
    let biz_days = calendar_days * BUSINESS_DAYS_PER_YEAR / CALENDAR_DAYS_PER_YEAR;
    let growth = Decimal::ONE + annual_pct / dec!(100);
    if growth <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    match growth.checked_powd(biz_days / BUSINESS_DAYS_PER_YEAR) {
        Some(factor) => last_value * factor,
        None => last_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn p(y: i32, m: u32, day: u32, value: Decimal) -> ValuePoint {
        ValuePoint {
            date: d(y, m, day),
            value,
        }
    }

    /// Monthly CDI-like index, ~0.4% per month.
    fn sample_series() -> ValueSeries {
        ValueSeries::new(vec![
            p(2020, 1, 1, dec!(1.0)),
            p(2020, 2, 1, dec!(1.004)),
            p(2020, 3, 1, dec!(1.008016)),
            p(2020, 4, 1, dec!(1.012048)),
            p(2020, 5, 1, dec!(1.016096)),
            p(2020, 6, 1, dec!(1.020161)),
            p(2020, 7, 1, dec!(1.024241)),
        ])
    }

    #[test]
    fn test_exact_match_returns_stored_value() {
        let (value, date) = sample_series().value_at(d(2020, 2, 1), None);
        assert_eq!(value, Some(dec!(1.004)));
        assert_eq!(date, Some(d(2020, 2, 1)));
    }

    #[test]
    fn test_interpolation_strictly_between_endpoints() {
        let (value, date) = sample_series().value_at(d(2020, 2, 15), None);
        let v = value.unwrap();
        assert!(v > dec!(1.004) && v < dec!(1.008016), "got {v}");
        assert_eq!(date, Some(d(2020, 2, 15)));
    }

    #[test]
    fn test_before_first_point_is_none() {
        assert_eq!(sample_series().value_at(d(2019, 1, 1), None), (None, None));
    }

    #[test]
    fn test_extrapolation_references_last_stored_date() {
        let (value, date) = sample_series().value_at(d(2020, 8, 1), None);
        assert!(value.unwrap() > dec!(1.024241));
        assert_eq!(date, Some(d(2020, 7, 1)));
    }

    #[test]
    fn test_extrapolation_with_explicit_rate() {
        let series = sample_series();
        let slow = series.value_at(d(2020, 8, 1), Some(dec!(1))).0.unwrap();
        let fast = series.value_at(d(2020, 8, 1), Some(dec!(50))).0.unwrap();
        assert!(fast > slow);
    }

    #[test]
    fn test_empty_series() {
        let series = ValueSeries::new(vec![]);
        assert_eq!(series.value_at(d(2020, 2, 1), None), (None, None));
    }

    #[test]
    fn test_single_point_extrapolates_flat_without_rate() {
        let series = ValueSeries::new(vec![p(2020, 1, 1, dec!(1.0))]);

        let (value, _) = series.value_at(d(2020, 1, 1), None);
        assert_eq!(value, Some(dec!(1.0)));

        let (value, date) = series.value_at(d(2020, 2, 1), None);
        assert_eq!(value, Some(dec!(1.0)));
        assert_eq!(date, Some(d(2020, 1, 1)));
    }

    #[test]
    fn test_duplicate_dates_keep_last_value() {
        let series = ValueSeries::new(vec![p(2020, 1, 1, dec!(1.0)), p(2020, 1, 1, dec!(2.0))]);
        assert_eq!(series.len(), 1);
        assert_eq!(series.value_at(d(2020, 1, 1), None).0, Some(dec!(2.0)));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let series = ValueSeries::new(vec![p(2020, 3, 1, dec!(1.2)), p(2020, 1, 1, dec!(1.0))]);
        assert_eq!(series.first().unwrap().date, d(2020, 1, 1));
        let v = series.value_at(d(2020, 2, 1), None).0.unwrap();
        assert!(v > dec!(1.0) && v < dec!(1.2));
    }
}
