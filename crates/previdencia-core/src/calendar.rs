//! Brazilian market calendar.
//!
//! The XIRR solver discounts historical cash flows over actual business
//! days under the ANBIMA national calendar: weekends plus the fixed and
//! movable Brazilian holidays. Movable feasts (Carnival, Good Friday,
//! Corpus Christi) derive from Easter via the Gregorian computus.
//!
//! Forward-looking conversions (extrapolation, overhead) never consult
//! this calendar; they use the 252/365 calendar-day approximation in
//! their own modules.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Easter Sunday for `year` (anonymous Gregorian computus).
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .expect("computus always yields a valid March/April date")
}

/// National holidays observed by the Brazilian bond market in `year`.
fn holidays(year: i32) -> Vec<NaiveDate> {
    let ymd = |m: u32, d: u32| NaiveDate::from_ymd_opt(year, m, d).unwrap();
    let easter = easter_sunday(year);

    let mut days = vec![
        ymd(1, 1),                    // Confraternização Universal
        easter - Duration::days(48),  // Carnival Monday
        easter - Duration::days(47),  // Carnival Tuesday
        easter - Duration::days(2),   // Good Friday
        ymd(4, 21),                   // Tiradentes
        ymd(5, 1),                    // Dia do Trabalho
        easter + Duration::days(60),  // Corpus Christi
        ymd(9, 7),                    // Independência
        ymd(10, 12),                  // Nossa Senhora Aparecida
        ymd(11, 2),                   // Finados
        ymd(11, 15),                  // Proclamação da República
        ymd(12, 25),                  // Natal
    ];
    // National holiday since Law 14.759/2023
    if year >= 2024 {
        days.push(ymd(11, 20)); // Consciência Negra
    }
    days
}

/// True when `date` is neither a weekend nor a national holiday.
pub fn is_business_day(date: NaiveDate) -> bool {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => false,
        _ => !holidays(date.year()).contains(&date),
    }
}

/// Business days in `(start, end]`. Returns 0 when `end <= start`.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end <= start {
        return 0;
    }
    let mut count = 0;
    let mut day = start + Duration::days(1);
    while day <= end {
        if is_business_day(day) {
            count += 1;
        }
        day = day + Duration::days(1);
    }
    count
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap() - Duration::days(1)
}

/// First calendar day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}
