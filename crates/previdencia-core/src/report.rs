//! Presentation-ready scalars and table rows.
//!
//! The core's entire output surface to the display layer: Brazilian
//! currency and percentage strings, and the position / contributions
//! tables keyed by human-readable month labels. Missing cells render as
//! "-" so exports stay rectangular.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::series::ValueSeries;
use crate::statement::rows::{ContributionScope, MonthlyContribution};
use crate::types::{ContributionRecord, Money, PositionPoint, ValuePoint};

/// "R$ 1.234,56" — Brazilian grouping, two decimals, minus sign before
/// the digits.
pub fn format_currency(value: Money) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();

    let text = format!("{:.2}", abs);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("R$ -{grouped},{frac_part}")
    } else {
        format!("R$ {grouped},{frac_part}")
    }
}

/// "+10,50% a.a." — annualized percentage with explicit sign.
pub fn format_percentage(pct: Decimal, signed: bool) -> String {
    let rounded = pct.round_dp(2);
    let text = format!("{:.2}", rounded.abs()).replace('.', ",");
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{text}% a.a.")
    } else if signed {
        format!("+{text}% a.a.")
    } else {
        format!("{text}% a.a.")
    }
}

/// Raw index value with fixed decimals ("1.004816").
pub fn format_index(value: Decimal, decimals: u32) -> String {
    format!("{:.prec$}", value.round_dp(decimals), prec = decimals as usize)
}

/// "Jan 2024" — the month key shared by all tables.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// "01/2024" — the short month form used in card labels.
pub fn month_short(date: NaiveDate) -> String {
    date.format("%m/%Y").to_string()
}

/// Benchmark columns joined into the position table.
pub struct BenchmarkTableSeries {
    pub label: String,
    pub overhead_pct: Decimal,
    /// Simulated positions against the raw index.
    pub simulated: Vec<ValuePoint>,
    /// Simulated positions against the overhead-adjusted index; only
    /// with a nonzero overhead.
    pub simulated_overhead: Option<Vec<ValuePoint>>,
    pub index: ValueSeries,
    pub index_overhead: Option<ValueSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionTableRow {
    pub month: String,
    pub position: String,
    pub total_contributed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_contributed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deflator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_simulated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_simulated_overhead: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_index_overhead: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionsTableRow {
    pub month: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,
    pub total: String,
    pub invested_cumulative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cumulative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deflator: Option<String>,
}

/// Month-label lookup of a series' raw values; within a month the last
/// observation wins.
fn month_value_map(series: &ValueSeries) -> HashMap<String, Decimal> {
    let mut map = HashMap::new();
    for point in series.points() {
        map.insert(month_label(point.date), point.value);
    }
    map
}

fn simulated_value_map(points: &[ValuePoint]) -> HashMap<String, Decimal> {
    let mut map = HashMap::new();
    for point in points {
        map.insert(month_label(point.date), point.value);
    }
    map
}

fn lookup_currency(map: &HashMap<String, Decimal>, key: &str) -> String {
    map.get(key)
        .map(|v| format_currency(*v))
        .unwrap_or_else(|| "-".to_string())
}

fn lookup_index(map: &HashMap<String, Decimal>, key: &str, decimals: u32) -> String {
    map.get(key)
        .map(|v| format_index(*v, decimals))
        .unwrap_or_else(|| "-".to_string())
}

impl BenchmarkTableSeries {
    fn overhead_label(&self) -> String {
        format!("{} +{}%", self.label, self.overhead_pct)
    }
}

/// Human column headers for `position_table` rows, in export order.
pub fn position_table_headers(
    scope: ContributionScope,
    deflator_label: Option<&str>,
    benchmark: Option<&BenchmarkTableSeries>,
) -> Vec<String> {
    let mut headers = vec![
        "Data".to_string(),
        "Posição".to_string(),
        "Contrib. Total".to_string(),
    ];
    if scope == ContributionScope::ParticipantOnly {
        headers.push("Contrib. Participante".to_string());
    }
    if let Some(label) = deflator_label {
        headers.push(format!("Deflator ({label})"));
    }
    if let Some(bench) = benchmark {
        headers.push(format!("{} (simulado)", bench.label));
        if bench.simulated_overhead.is_some() {
            headers.push(format!("{} (simulado)", bench.overhead_label()));
        }
        headers.push(format!("{} (índice)", bench.label));
        if bench.index_overhead.is_some() {
            headers.push(format!("{} (índice)", bench.overhead_label()));
        }
    }
    headers
}

/// Human column headers for `contributions_table` rows, in export order.
pub fn contributions_table_headers(
    scope: ContributionScope,
    has_positions: bool,
    deflator_label: Option<&str>,
) -> Vec<String> {
    let mut headers = vec!["Data".to_string()];
    if scope == ContributionScope::ParticipantOnly {
        headers.push("Contrib. Participante".to_string());
        headers.push("Contrib. Patrocinador".to_string());
    }
    headers.push("Contrib. Total".to_string());
    headers.push("Total Investido".to_string());
    if scope == ContributionScope::ParticipantOnly {
        headers.push("Contrib. Total Acum.".to_string());
    }
    if has_positions {
        headers.push("Posição".to_string());
    }
    if let Some(label) = deflator_label {
        headers.push(format!("Deflator ({label})"));
    }
    headers
}

/// One row per position month: the account value, money put in so far,
/// and the optional deflator / benchmark columns.
pub fn position_table(
    positions: &[PositionPoint],
    contributions: &[ContributionRecord],
    scope: ContributionScope,
    deflator_index: Option<&ValueSeries>,
    benchmark: Option<&BenchmarkTableSeries>,
) -> Vec<PositionTableRow> {
    let show_participant = scope == ContributionScope::ParticipantOnly;
    let deflator_map = deflator_index.map(month_value_map);
    let benchmark_maps = benchmark.map(|b| {
        (
            simulated_value_map(&b.simulated),
            b.simulated_overhead.as_deref().map(simulated_value_map),
            month_value_map(&b.index),
            b.index_overhead.as_ref().map(month_value_map),
        )
    });

    positions
        .iter()
        .map(|point| {
            let key = month_label(point.date);

            let mut total_contributed = Decimal::ZERO;
            let mut participant_contributed = Decimal::ZERO;
            for record in contributions.iter().filter(|r| r.date <= point.date) {
                total_contributed += record.total;
                participant_contributed += record.participant;
            }

            let (bench_sim, bench_sim_over, bench_idx, bench_idx_over) = match &benchmark_maps {
                Some((sim, sim_over, idx, idx_over)) => (
                    Some(lookup_currency(sim, &key)),
                    sim_over.as_ref().map(|m| lookup_currency(m, &key)),
                    Some(lookup_index(idx, &key, 4)),
                    idx_over.as_ref().map(|m| lookup_index(m, &key, 4)),
                ),
                None => (None, None, None, None),
            };

            PositionTableRow {
                position: format_currency(point.position),
                total_contributed: format_currency(total_contributed),
                participant_contributed: show_participant
                    .then(|| format_currency(participant_contributed)),
                deflator: deflator_map
                    .as_ref()
                    .map(|m| lookup_index(m, &key, 6)),
                benchmark_simulated: bench_sim,
                benchmark_simulated_overhead: bench_sim_over,
                benchmark_index: bench_idx,
                benchmark_index_overhead: bench_idx_over,
                month: key,
            }
        })
        .collect()
}

/// One row per contribution month, with the cumulative invested under
/// the active scope and the matching month-end position.
pub fn contributions_table(
    monthly: &[MonthlyContribution],
    positions: &[PositionPoint],
    scope: ContributionScope,
    deflator_index: Option<&ValueSeries>,
) -> Vec<ContributionsTableRow> {
    let show_split = scope == ContributionScope::ParticipantOnly;
    let deflator_map = deflator_index.map(month_value_map);
    let position_by_date: HashMap<NaiveDate, Money> = positions
        .iter()
        .map(|point| (point.date, point.position))
        .collect();

    monthly
        .iter()
        .map(|month| {
            let key = month_label(month.date);
            let invested_cumulative = if show_split {
                month.cumulative_participant
            } else {
                month.cumulative_total
            };
            let position = if positions.is_empty() {
                None
            } else {
                Some(
                    position_by_date
                        .get(&month.date)
                        .map(|v| format_currency(*v))
                        .unwrap_or_else(|| "-".to_string()),
                )
            };

            ContributionsTableRow {
                participant: show_split.then(|| format_currency(month.participant)),
                sponsor: show_split.then(|| format_currency(month.sponsor)),
                total: format_currency(month.total),
                invested_cumulative: format_currency(invested_cumulative),
                total_cumulative: show_split.then(|| format_currency(month.cumulative_total)),
                position,
                deflator: deflator_map
                    .as_ref()
                    .map(|m| lookup_index(m, &key, 6)),
                month: key,
            }
        })
        .collect()
}
