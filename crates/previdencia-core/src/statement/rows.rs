//! Contribution records derived from parsed statement rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::month_end;
use crate::types::{ContributionKind, ContributionRecord, Money, TransactionRow};

/// Which contribution money counts as "invested" for return figures.
///
/// `ParticipantOnly` implements the "treat sponsor money as free"
/// toggle: sponsor deposits still grow the position but are excluded
/// from invested totals and rate calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionScope {
    Total,
    ParticipantOnly,
}

impl ContributionScope {
    pub fn amount(&self, record: &ContributionRecord) -> Money {
        match self {
            ContributionScope::Total => record.total,
            ContributionScope::ParticipantOnly => record.participant,
        }
    }

    pub fn cumulative(&self, record: &ContributionRecord) -> Money {
        match self {
            ContributionScope::Total => record.cumulative_total,
            ContributionScope::ParticipantOnly => record.cumulative_participant,
        }
    }
}

/// Contributions of one calendar month, dated at month-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyContribution {
    pub date: NaiveDate,
    pub participant: Money,
    pub sponsor: Money,
    pub total: Money,
    pub cumulative_participant: Money,
    pub cumulative_sponsor: Money,
    pub cumulative_total: Money,
}

/// Aggregate contribution rows by exact date.
///
/// Fee and tax rows (`is_contribution == false`) are ignored. Each
/// record's amount is `units_delta * unit_value` at the row's own quota
/// price; rows sharing a date merge into one record with the
/// participant/sponsor split and running cumulative sums.
pub fn contribution_records(rows: &[TransactionRow]) -> Vec<ContributionRecord> {
    let mut by_date: BTreeMap<NaiveDate, (Money, Money, NaiveDate)> = BTreeMap::new();

    for row in rows {
        if !row.is_contribution || row.units_delta <= Decimal::ZERO {
            continue;
        }
        let amount = row.units_delta * row.unit_value;
        let entry = by_date
            .entry(row.exact_date)
            .or_insert((Decimal::ZERO, Decimal::ZERO, row.month_anchor));
        match row.kind {
            ContributionKind::Participant => entry.0 += amount,
            ContributionKind::Sponsor => entry.1 += amount,
        }
    }

    let mut cumulative_participant = Decimal::ZERO;
    let mut cumulative_sponsor = Decimal::ZERO;
    by_date
        .into_iter()
        .map(|(date, (participant, sponsor, month_anchor))| {
            cumulative_participant += participant;
            cumulative_sponsor += sponsor;
            ContributionRecord {
                date,
                month_anchor,
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

/// Roll contribution records up to one row per calendar month, dated at
/// month-end, with running cumulative sums.
pub fn monthly_contributions(records: &[ContributionRecord]) -> Vec<MonthlyContribution> {
    let mut by_month: BTreeMap<NaiveDate, (Money, Money)> = BTreeMap::new();
    for record in records {
        let entry = by_month
            .entry(month_end(record.date))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += record.participant;
        entry.1 += record.sponsor;
    }

    let mut cumulative_participant = Decimal::ZERO;
    let mut cumulative_sponsor = Decimal::ZERO;
    by_month
        .into_iter()
        .map(|(date, (participant, sponsor))| {
            cumulative_participant += participant;
            cumulative_sponsor += sponsor;
            MonthlyContribution {
                date,
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
