//! Business-day annuity solver.
//!
//! Annualizes irregular cash flows under the Brazilian 252-business-day
//! convention: each flow is discounted by `(1+r)^(du/252)` where `du` is
//! the ANBIMA business-day count from the first flow. The root is found
//! by bisection over a wide bracket; when the bracket holds no sign
//! change, a standard calendar-day (365) XIRR is attempted as a
//! best-effort fallback before giving up.

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::calendar::business_days_between;
use crate::types::{Money, Rate};

pub const BUSINESS_DAYS_PER_YEAR: Decimal = dec!(252);
pub const CALENDAR_DAYS_PER_YEAR: Decimal = dec!(365);

const BRACKET_LOW: Decimal = dec!(-0.99);
const BRACKET_HIGH: Decimal = dec!(10);
const RATE_TOLERANCE: Decimal = dec!(0.0000000001);
const MAX_BISECTION_ITERATIONS: u32 = 200;
const MAX_NEWTON_ITERATIONS: u32 = 100;
const NEWTON_CONVERGENCE: Decimal = dec!(0.0000001);

/// Annualized money-weighted return of `amounts` dated by `dates`,
/// under the 252-business-day convention.
///
/// Negative amounts are money leaving the investor (contributions),
/// positive amounts are money coming back (final valuation). Returns
/// `None` when the inputs are unusable or no solution exists.
pub fn solve_rate(dates: &[NaiveDate], amounts: &[Money]) -> Option<Rate> {
    if dates.len() != amounts.len() || dates.len() < 2 {
        return None;
    }

    let first_date = *dates.iter().min()?;
    let flows: Vec<(Decimal, Money)> = dates
        .iter()
        .zip(amounts.iter())
        .map(|(date, amount)| {
            (
                Decimal::from(business_days_between(first_date, *date)),
                *amount,
            )
        })
        .collect();

    bisect(&flows).or_else(|| xirr_calendar(dates, amounts))
}

/// NPV of business-day-indexed flows at `rate`.
///
/// Discount factors beyond Decimal's representable range are treated as
/// suppressing their term; an underflowed factor makes the term dominate
/// with the sign of its amount.
fn npv(rate: Rate, flows: &[(Decimal, Money)]) -> Decimal {
    let one_plus_r = Decimal::ONE + rate;
    let mut total = Decimal::ZERO;

    for (biz_days, amount) in flows {
        if biz_days.is_zero() {
            total += amount;
            continue;
        }
        match one_plus_r.checked_powd(biz_days / BUSINESS_DAYS_PER_YEAR) {
            None => continue,
            Some(discount) if discount.is_zero() => {
                return if amount.is_sign_negative() {
                    Decimal::MIN
                } else {
                    Decimal::MAX
                };
            }
            Some(discount) => total += amount / discount,
        }
    }
    total
}

/// Bracketed bisection over annual rates in `[-99%, +1000%]`.
fn bisect(flows: &[(Decimal, Money)]) -> Option<Rate> {
    let mut low = BRACKET_LOW;
    let mut high = BRACKET_HIGH;
    let mut npv_low = npv(low, flows);
    let npv_high = npv(high, flows);

    if npv_low.is_zero() {
        return Some(low);
    }
    if npv_high.is_zero() {
        return Some(high);
    }
    if npv_low.is_sign_positive() == npv_high.is_sign_positive() {
        return None;
    }

    let mut mid = (low + high) / dec!(2);
    for _ in 0..MAX_BISECTION_ITERATIONS {
        let npv_mid = npv(mid, flows);

        if npv_mid.is_zero() || (high - low) / dec!(2) < RATE_TOLERANCE {
            return Some(mid);
        }
        if npv_mid.is_sign_positive() == npv_low.is_sign_positive() {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
        mid = (low + high) / dec!(2);
    }
    Some(mid)
}

/// Calendar-day (365) XIRR via Newton-Raphson. Best-effort fallback for
/// flow patterns the business-day bracket cannot solve.
fn xirr_calendar(dates: &[NaiveDate], amounts: &[Money]) -> Option<Rate> {
    let first_date = *dates.iter().min()?;
    let mut rate = dec!(0.1);

    for _ in 0..MAX_NEWTON_ITERATIONS {
        let mut npv_val = Decimal::ZERO;
        let mut dnpv = Decimal::ZERO;
        let one_plus_r = Decimal::ONE + rate;

        if one_plus_r <= Decimal::ZERO {
            return None;
        }

        for (date, amount) in dates.iter().zip(amounts.iter()) {
            let days = Decimal::from((*date - first_date).num_days());
            let years = days / CALENDAR_DAYS_PER_YEAR;
            let discount = one_plus_r.checked_powd(years)?;
            if discount.is_zero() {
                continue;
            }
            npv_val += amount / discount;
            dnpv -= years * amount / (one_plus_r * discount);
        }

        if npv_val.abs() < NEWTON_CONVERGENCE {
            return Some(rate);
        }
        if dnpv.is_zero() {
            return None;
        }

        rate -= npv_val / dnpv;

        if rate < BRACKET_LOW {
            rate = BRACKET_LOW;
        } else if rate > dec!(100) {
            rate = dec!(100);
        }
    }
    None
}
