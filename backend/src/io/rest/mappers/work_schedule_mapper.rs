use shared::{MonthlySummary, UpsertWorkScheduleRequest, WorkScheduleEntry};

use crate::domain::commands::work_schedule::UpsertWorkScheduleCommand;
use crate::domain::models::work_schedule::DomainWorkScheduleEntry;
use crate::domain::monthly_aggregator::DomainMonthlySummary;

pub struct WorkScheduleMapper;

impl WorkScheduleMapper {
    pub fn to_dto(domain: DomainWorkScheduleEntry) -> WorkScheduleEntry {
        WorkScheduleEntry {
            id: domain.id,
            consultant_id: domain.consultant_id,
            date: domain.date,
            period: domain.period,
            work_type: domain.work_type,
            leave_type: domain.leave_type,
            legacy_type: domain.legacy_type,
            absence_type: domain.legacy_absence_type,
            days_worked: domain.days_worked,
            weekend_worked: domain.weekend_worked,
            absence_days: domain.absence_days,
            work_type_days: domain.work_type_days,
            month: domain.month,
            year: domain.year,
        }
    }

    pub fn to_dto_list(entries: Vec<DomainWorkScheduleEntry>) -> Vec<WorkScheduleEntry> {
        entries.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_upsert_command(request: UpsertWorkScheduleRequest) -> UpsertWorkScheduleCommand {
        UpsertWorkScheduleCommand {
            consultant_id: request.consultant_id,
            date: request.date,
            period: request.period,
            work_type: request.work_type,
            leave_type: request.leave_type,
            legacy_type: request.legacy_type,
            legacy_absence_type: request.absence_type,
            days_worked: request.days_worked,
            weekend_worked: request.weekend_worked,
            absence_days: request.absence_days,
            work_type_days: request.work_type_days,
        }
    }

    /// Labels are joined with ", " on the wire
    pub fn summary_to_dto(domain: DomainMonthlySummary, month_label: String) -> MonthlySummary {
        MonthlySummary {
            consultant_id: domain.consultant_id,
            month: domain.month,
            year: domain.year,
            month_label,
            days_worked: domain.days_worked,
            weekend_worked: domain.weekend_worked,
            absence_days: domain.absence_days,
            work_type_days: domain.work_type_days,
            absence_types: domain.absence_types.join(", "),
            work_types: domain.work_types.join(", "),
        }
    }
}
