use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shared::{LabelRef, Period};

/// A stored timesheet row as the domain sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainWorkScheduleEntry {
    pub id: i64,
    pub consultant_id: i64,
    pub date: String,
    pub period: Option<Period>,
    pub work_type: Option<LabelRef>,
    pub leave_type: Option<LabelRef>,
    pub legacy_type: Option<String>,
    pub legacy_absence_type: Option<String>,
    pub days_worked: f64,
    pub weekend_worked: f64,
    pub absence_days: f64,
    pub work_type_days: f64,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl DomainWorkScheduleEntry {
    /// The (year, month) this entry is accounted to.
    ///
    /// Uses the denormalized month/year when both are present and sane, and
    /// falls back to the date column for rows written before those existed.
    pub fn accounting_period(&self) -> Option<(i32, u32)> {
        match (self.year, self.month) {
            (Some(year), Some(month)) if (1..=12).contains(&month) => Some((year, month)),
            _ => parse_entry_date(&self.date).map(|d| (d.year(), d.month())),
        }
    }

    /// Chronological position used to make folds order independent
    pub fn sort_key(&self) -> (Option<NaiveDate>, u8, i64) {
        let period_rank = match self.period {
            Some(Period::Morning) => 1,
            Some(Period::Evening) => 2,
            None => 0,
        };
        (parse_entry_date(&self.date), period_rank, self.id)
    }
}

/// Values needed to write a schedule row; month/year are derived from `date`
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkScheduleEntry {
    pub consultant_id: i64,
    pub date: NaiveDate,
    pub period: Option<Period>,
    pub work_type: Option<LabelRef>,
    pub leave_type: Option<LabelRef>,
    pub legacy_type: Option<String>,
    pub legacy_absence_type: Option<String>,
    pub days_worked: f64,
    pub weekend_worked: f64,
    pub absence_days: f64,
    pub work_type_days: f64,
}

/// Parse the date column of a schedule row.
///
/// Accepts plain dates, SQL datetimes and RFC 3339 timestamps; anything else
/// yields `None`.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

pub fn period_to_column(period: Option<Period>) -> &'static str {
    match period {
        Some(Period::Morning) => "morning",
        Some(Period::Evening) => "evening",
        None => "",
    }
}

pub fn period_from_column(value: &str) -> Option<Period> {
    match value {
        "morning" => Some(Period::Morning),
        "evening" => Some(Period::Evening),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, month: Option<u32>, year: Option<i32>) -> DomainWorkScheduleEntry {
        DomainWorkScheduleEntry {
            id: 1,
            consultant_id: 10,
            date: date.to_string(),
            period: None,
            work_type: None,
            leave_type: None,
            legacy_type: None,
            legacy_absence_type: None,
            days_worked: 1.0,
            weekend_worked: 0.0,
            absence_days: 0.0,
            work_type_days: 0.0,
            month,
            year,
        }
    }

    #[test]
    fn test_parse_entry_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 15);
        assert_eq!(parse_entry_date("2026-01-15"), expected);
        assert_eq!(parse_entry_date("2026-01-15 08:30:00"), expected);
        assert_eq!(parse_entry_date("2026-01-15T08:30:00+01:00"), expected);
        assert_eq!(parse_entry_date("15/01/2026"), None);
        assert_eq!(parse_entry_date(""), None);
    }

    #[test]
    fn test_accounting_period_prefers_denormalized_fields() {
        assert_eq!(entry("2025-12-31", Some(1), Some(2026)).accounting_period(), Some((2026, 1)));
        assert_eq!(entry("2025-12-31", None, None).accounting_period(), Some((2025, 12)));
        assert_eq!(entry("2025-12-31", Some(13), Some(2026)).accounting_period(), Some((2025, 12)));
        assert_eq!(entry("not a date", None, Some(2026)).accounting_period(), None);
    }
}
