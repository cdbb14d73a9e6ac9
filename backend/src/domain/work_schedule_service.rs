//! Schedule ledger operations and the CRA views built on top of it.
//!
//! Consultants and their managers write timesheet rows; every party of the
//! consultant may read them, along with the monthly figures and the signature
//! state of each month. Rows of a month are frozen once its CRA carries a
//! signature.

use chrono::{Datelike, Locale};
use shared::SignerRole;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::authorization::SigningAuthority;
use crate::domain::commands::work_schedule::{CraMonth, UpsertWorkScheduleCommand, WorkScheduleListQuery};
use crate::domain::errors::CraError;
use crate::domain::models::signature::{Actor, SignatureKey, SignatureRecord};
use crate::domain::models::work_schedule::{DomainWorkScheduleEntry, NewWorkScheduleEntry};
use crate::domain::monthly_aggregator::{aggregate, aggregate_month, month_label, DomainMonthlySummary};
use crate::domain::signature_workflow::validate_key;
use crate::storage::{SignatureStorage, WorkScheduleStorage};

/// Upper bound of any quantity on a single row
pub const MAX_ROW_QUANTITY: f64 = 1.5;

#[derive(Clone)]
pub struct WorkScheduleService {
    schedules: Arc<dyn WorkScheduleStorage>,
    signatures: Arc<dyn SignatureStorage>,
    authority: Arc<dyn SigningAuthority>,
    locale: Locale,
}

impl WorkScheduleService {
    pub fn new(
        schedules: Arc<dyn WorkScheduleStorage>,
        signatures: Arc<dyn SignatureStorage>,
        authority: Arc<dyn SigningAuthority>,
        locale: Locale,
    ) -> Self {
        Self {
            schedules,
            signatures,
            authority,
            locale,
        }
    }

    pub async fn list_entries(
        &self,
        actor: &Actor,
        consultant_id: i64,
        query: WorkScheduleListQuery,
    ) -> Result<Vec<DomainWorkScheduleEntry>, CraError> {
        self.authority.authorize(actor, consultant_id).await?;
        let entries = match (query.month, query.year) {
            (Some(month), Some(year)) => {
                let key = validate_key(consultant_id, month, year)?;
                self.schedules.list_entries_for_month(&key).await?
            }
            (None, None) => self.schedules.list_entries(consultant_id).await?,
            _ => return Err(CraError::validation("month and year must be given together")),
        };
        Ok(entries)
    }

    pub async fn upsert_entry(
        &self,
        actor: &Actor,
        command: UpsertWorkScheduleCommand,
    ) -> Result<DomainWorkScheduleEntry, CraError> {
        if actor.role() == SignerRole::Client {
            return Err(CraError::forbidden("Clients cannot edit work schedules"));
        }
        let date = command
            .parsed_date()
            .ok_or_else(|| CraError::validation(format!("Invalid date: {} (expected YYYY-MM-DD)", command.date)))?;
        for (name, value) in [
            ("days_worked", command.days_worked),
            ("weekend_worked", command.weekend_worked),
            ("absence_days", command.absence_days),
            ("work_type_days", command.work_type_days),
        ] {
            if !value.is_finite() || !(0.0..=MAX_ROW_QUANTITY).contains(&value) {
                return Err(CraError::validation(format!(
                    "{} must be between 0 and {}, got {}",
                    name, MAX_ROW_QUANTITY, value
                )));
            }
        }
        self.authority.authorize(actor, command.consultant_id).await?;

        let key = SignatureKey::new(command.consultant_id, date.month(), date.year());
        if let Some(record) = self.signatures.get_record(&key).await? {
            if record.has_any_signature() {
                return Err(CraError::forbidden(format!(
                    "CRA {} already carries signatures, its schedule can no longer change",
                    key
                )));
            }
        }

        let entry = NewWorkScheduleEntry {
            consultant_id: command.consultant_id,
            date,
            period: command.period,
            work_type: command.work_type,
            leave_type: command.leave_type,
            legacy_type: non_blank(command.legacy_type),
            legacy_absence_type: non_blank(command.legacy_absence_type),
            days_worked: command.days_worked,
            weekend_worked: command.weekend_worked,
            absence_days: command.absence_days,
            work_type_days: command.work_type_days,
        };
        let stored = self.schedules.upsert_entry(&entry).await?;
        info!("{} saved schedule entry {} for consultant {} on {}", actor, stored.id, stored.consultant_id, stored.date);
        Ok(stored)
    }

    pub async fn cra_month(&self, actor: &Actor, key: SignatureKey) -> Result<CraMonth, CraError> {
        let key = validate_key(key.consultant_id, key.month, key.year)?;
        self.authority.authorize(actor, key.consultant_id).await?;

        let entries = self.schedules.list_entries_for_month(&key).await?;
        let record = self.signatures.get_record(&key).await?;
        if entries.is_empty() && record.is_none() {
            return Err(CraError::not_found(format!("No CRA data for {}", key)));
        }
        let summary = aggregate_month(&entries, key.consultant_id, key.month, key.year)
            .unwrap_or_else(|| DomainMonthlySummary::empty(key.consultant_id, key.month, key.year));
        Ok(self.cra(summary, record))
    }

    /// Every month with rows or a signature record, oldest first
    pub async fn cra_overview(&self, actor: &Actor, consultant_id: i64) -> Result<Vec<CraMonth>, CraError> {
        self.authority.authorize(actor, consultant_id).await?;
        let entries = self.schedules.list_entries(consultant_id).await?;
        let records = self.signatures.list_records(consultant_id).await?;

        let mut months: BTreeMap<(i32, u32), (Option<DomainMonthlySummary>, Option<SignatureRecord>)> = BTreeMap::new();
        for summary in aggregate(&entries) {
            let period = (summary.year, summary.month);
            months.entry(period).or_default().0 = Some(summary);
        }
        for record in records {
            let period = (record.key.year, record.key.month);
            months.entry(period).or_default().1 = Some(record);
        }

        Ok(months
            .into_iter()
            .map(|((year, month), (summary, record))| {
                let summary = summary.unwrap_or_else(|| DomainMonthlySummary::empty(consultant_id, month, year));
                self.cra(summary, record)
            })
            .collect())
    }

    fn cra(&self, summary: DomainMonthlySummary, record: Option<SignatureRecord>) -> CraMonth {
        CraMonth {
            month_label: month_label(summary.year, summary.month, self.locale),
            summary,
            record,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
