//! Monthly aggregation of timesheet rows into CRA figures.
//!
//! The fold is pure: the same set of entries produces the same summaries no
//! matter how the slice is ordered. Entries are sorted by date, period and id
//! before folding, so quantities are always added in the same order and the
//! "first seen" order of labels is stable too.
//!
//! Rows whose accounting month cannot be determined (no usable month/year and
//! an unparseable date) are skipped. Historical data contains such rows and a
//! CRA must still be computable around them.

use chrono::{Locale, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::models::work_schedule::DomainWorkScheduleEntry;

/// Figures of one consultant for one month
#[derive(Debug, Clone, PartialEq)]
pub struct DomainMonthlySummary {
    pub consultant_id: i64,
    pub month: u32,
    pub year: i32,
    pub days_worked: f64,
    pub weekend_worked: f64,
    pub absence_days: f64,
    pub work_type_days: f64,
    pub absence_types: Vec<String>,
    pub work_types: Vec<String>,
}

impl DomainMonthlySummary {
    /// Zero figures, for a month that has a signature record but no rows
    pub fn empty(consultant_id: i64, month: u32, year: i32) -> Self {
        Accumulator::default().finish(consultant_id, year, month)
    }
}

#[derive(Default)]
struct Accumulator {
    days_worked: f64,
    weekend_worked: f64,
    absence_days: f64,
    work_type_days: f64,
    absence_types: Vec<String>,
    work_types: Vec<String>,
}

impl Accumulator {
    fn add(&mut self, entry: &DomainWorkScheduleEntry) {
        self.days_worked += finite(entry.days_worked);
        self.weekend_worked += finite(entry.weekend_worked);
        self.absence_days += finite(entry.absence_days);
        self.work_type_days += finite(entry.work_type_days);

        if let Some(label) = absence_label(entry) {
            push_distinct(&mut self.absence_types, label);
        }
        if let Some(label) = work_label(entry) {
            push_distinct(&mut self.work_types, label);
        }
    }

    fn finish(self, consultant_id: i64, year: i32, month: u32) -> DomainMonthlySummary {
        DomainMonthlySummary {
            consultant_id,
            month,
            year,
            days_worked: self.days_worked,
            weekend_worked: self.weekend_worked,
            absence_days: self.absence_days,
            work_type_days: self.work_type_days,
            absence_types: self.absence_types,
            work_types: self.work_types,
        }
    }
}

/// Group entries by (consultant, year, month) and fold each group.
///
/// Output is ordered by consultant, then year, then month.
pub fn aggregate(entries: &[DomainWorkScheduleEntry]) -> Vec<DomainMonthlySummary> {
    let mut ordered: Vec<&DomainWorkScheduleEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.sort_key());

    let mut groups: BTreeMap<(i64, i32, u32), Accumulator> = BTreeMap::new();
    for entry in ordered {
        let Some((year, month)) = entry.accounting_period() else {
            debug!(
                "Skipping schedule entry {} with unusable date {:?}",
                entry.id, entry.date
            );
            continue;
        };
        groups
            .entry((entry.consultant_id, year, month))
            .or_default()
            .add(entry);
    }

    groups
        .into_iter()
        .map(|((consultant_id, year, month), acc)| acc.finish(consultant_id, year, month))
        .collect()
}

/// Fold only the entries of one consultant-month
pub fn aggregate_month(
    entries: &[DomainWorkScheduleEntry],
    consultant_id: i64,
    month: u32,
    year: i32,
) -> Option<DomainMonthlySummary> {
    aggregate(entries)
        .into_iter()
        .find(|s| s.consultant_id == consultant_id && s.month == month && s.year == year)
}

/// Display name of a month, e.g. "janvier 2026" for `fr_FR`
pub fn month_label(year: i32, month: u32, locale: Locale) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format_localized("%B %Y", locale).to_string(),
        None => format!("{:04}-{:02}", year, month),
    }
}

/// Turn a legacy code such as `paid_leave` into `Paid leave`
pub fn humanize_code(code: &str) -> Option<String> {
    let cleaned = code.trim().replace(['_', '-'], " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = cleaned.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
}

fn absence_label(entry: &DomainWorkScheduleEntry) -> Option<String> {
    match &entry.leave_type {
        Some(leave) if !leave.name.trim().is_empty() => Some(leave.name.trim().to_string()),
        _ => entry.legacy_absence_type.as_deref().and_then(humanize_code),
    }
}

fn work_label(entry: &DomainWorkScheduleEntry) -> Option<String> {
    match &entry.work_type {
        Some(work) if !work.name.trim().is_empty() => Some(work.name.trim().to_string()),
        _ => entry.legacy_type.as_deref().and_then(humanize_code),
    }
}

fn push_distinct(labels: &mut Vec<String>, label: String) {
    if !labels.contains(&label) {
        labels.push(label);
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
