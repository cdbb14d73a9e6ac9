use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use shared::LabelRef;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::signature::SignatureKey;
use crate::domain::models::work_schedule::{
    period_from_column, period_to_column, DomainWorkScheduleEntry, NewWorkScheduleEntry,
};
use crate::storage::connection::DbConnection;
use crate::storage::traits::WorkScheduleStorage;

const ENTRY_COLUMNS: &str = r#"
    id, consultant_id, date, period, work_type_id, work_type_name,
    leave_type_id, leave_type_name, type, absence_type, days_worked,
    weekend_worked, absence_days, work_type_days, month, year
"#;

/// Matches rows of one month, whether or not month/year were denormalized
const MONTH_FILTER: &str = r#"
    consultant_id = ?
    AND ((month = ? AND year = ?) OR ((month IS NULL OR year IS NULL) AND substr(date, 1, 7) = ?))
"#;

const ENTRY_ORDER: &str = r#"
    date ASC,
    CASE period WHEN 'morning' THEN 1 WHEN 'evening' THEN 2 ELSE 0 END ASC,
    id ASC
"#;

/// Repository for work schedule rows
#[derive(Clone)]
pub struct WorkScheduleRepository {
    db: DbConnection,
}

impl WorkScheduleRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn entry_from_row(row: &SqliteRow) -> Result<DomainWorkScheduleEntry> {
        let label = |id: Option<i64>, name: Option<String>| match (id, name) {
            (Some(id), Some(name)) => Some(LabelRef { id, name }),
            _ => None,
        };
        let period: String = row.try_get("period")?;
        let month: Option<i64> = row.try_get("month")?;
        let year: Option<i64> = row.try_get("year")?;

        Ok(DomainWorkScheduleEntry {
            id: row.try_get("id")?,
            consultant_id: row.try_get("consultant_id")?,
            date: row.try_get("date")?,
            period: period_from_column(&period),
            work_type: label(row.try_get("work_type_id")?, row.try_get("work_type_name")?),
            leave_type: label(row.try_get("leave_type_id")?, row.try_get("leave_type_name")?),
            legacy_type: row.try_get("type")?,
            legacy_absence_type: row.try_get("absence_type")?,
            days_worked: row.try_get("days_worked")?,
            weekend_worked: row.try_get("weekend_worked")?,
            absence_days: row.try_get("absence_days")?,
            work_type_days: row.try_get("work_type_days")?,
            month: month.and_then(|m| u32::try_from(m).ok()),
            year: year.and_then(|y| i32::try_from(y).ok()),
        })
    }
}

#[async_trait]
impl WorkScheduleStorage for WorkScheduleRepository {
    async fn upsert_entry(&self, entry: &NewWorkScheduleEntry) -> Result<DomainWorkScheduleEntry> {
        let now = Utc::now().to_rfc3339();
        let date = entry.date.format("%Y-%m-%d").to_string();
        let period = period_to_column(entry.period);

        sqlx::query(
            r#"
            INSERT INTO work_schedules (
                consultant_id, date, period, work_type_id, work_type_name,
                leave_type_id, leave_type_name, type, absence_type, days_worked,
                weekend_worked, absence_days, work_type_days, month, year,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (consultant_id, date, period) DO UPDATE SET
                work_type_id = excluded.work_type_id,
                work_type_name = excluded.work_type_name,
                leave_type_id = excluded.leave_type_id,
                leave_type_name = excluded.leave_type_name,
                type = excluded.type,
                absence_type = excluded.absence_type,
                days_worked = excluded.days_worked,
                weekend_worked = excluded.weekend_worked,
                absence_days = excluded.absence_days,
                work_type_days = excluded.work_type_days,
                month = excluded.month,
                year = excluded.year,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entry.consultant_id)
        .bind(&date)
        .bind(period)
        .bind(entry.work_type.as_ref().map(|w| w.id))
        .bind(entry.work_type.as_ref().map(|w| w.name.clone()))
        .bind(entry.leave_type.as_ref().map(|l| l.id))
        .bind(entry.leave_type.as_ref().map(|l| l.name.clone()))
        .bind(&entry.legacy_type)
        .bind(&entry.legacy_absence_type)
        .bind(entry.days_worked)
        .bind(entry.weekend_worked)
        .bind(entry.absence_days)
        .bind(entry.work_type_days)
        .bind(entry.date.month() as i64)
        .bind(entry.date.year() as i64)
        .bind(&now)
        .bind(&now)
        .execute(self.db.pool())
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM work_schedules WHERE consultant_id = ? AND date = ? AND period = ?",
            ENTRY_COLUMNS
        ))
        .bind(entry.consultant_id)
        .bind(&date)
        .bind(period)
        .fetch_one(self.db.pool())
        .await?;

        Self::entry_from_row(&row)
    }

    async fn list_entries(&self, consultant_id: i64) -> Result<Vec<DomainWorkScheduleEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM work_schedules WHERE consultant_id = ? ORDER BY {}",
            ENTRY_COLUMNS, ENTRY_ORDER
        ))
        .bind(consultant_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::entry_from_row).collect()
    }

    async fn list_entries_for_month(&self, key: &SignatureKey) -> Result<Vec<DomainWorkScheduleEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM work_schedules WHERE {} ORDER BY {}",
            ENTRY_COLUMNS, MONTH_FILTER, ENTRY_ORDER
        ))
        .bind(key.consultant_id)
        .bind(key.month as i64)
        .bind(key.year as i64)
        .bind(key.date_prefix())
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::entry_from_row).collect()
    }

    async fn first_entry_id_for_month(&self, key: &SignatureKey) -> Result<Option<i64>> {
        let row = sqlx::query(&format!(
            "SELECT id FROM work_schedules WHERE {} ORDER BY date ASC, id ASC LIMIT 1",
            MONTH_FILTER
        ))
        .bind(key.consultant_id)
        .bind(key.month as i64)
        .bind(key.year as i64)
        .bind(key.date_prefix())
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_get("id")?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::Period;

    async fn setup_test() -> (DbConnection, WorkScheduleRepository) {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        let repo = db.work_schedule_repository();
        (db, repo)
    }

    fn new_entry(date: &str, period: Option<Period>, days_worked: f64) -> NewWorkScheduleEntry {
        NewWorkScheduleEntry {
            consultant_id: 10,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
            period,
            work_type: Some(LabelRef { id: 1, name: "Régie".to_string() }),
            leave_type: None,
            legacy_type: None,
            legacy_absence_type: None,
            days_worked,
            weekend_worked: 0.0,
            absence_days: 0.0,
            work_type_days: days_worked,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_half_day() {
        let (_db, repo) = setup_test().await;

        let first = repo
            .upsert_entry(&new_entry("2026-01-05", Some(Period::Morning), 0.5))
            .await
            .expect("Failed to insert entry");
        assert_eq!(first.month, Some(1));
        assert_eq!(first.year, Some(2026));

        let mut changed = new_entry("2026-01-05", Some(Period::Morning), 0.0);
        changed.absence_days = 0.5;
        let second = repo.upsert_entry(&changed).await.expect("Failed to update entry");
        assert_eq!(second.id, first.id);
        assert_eq!(second.absence_days, 0.5);

        repo.upsert_entry(&new_entry("2026-01-05", Some(Period::Evening), 0.5))
            .await
            .expect("Failed to insert evening");
        repo.upsert_entry(&new_entry("2026-01-05", None, 1.0))
            .await
            .expect("Failed to insert legacy full day");

        let entries = repo.list_entries(10).await.expect("Failed to list entries");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].period, None);
        assert_eq!(entries[1].period, Some(Period::Morning));
        assert_eq!(entries[2].period, Some(Period::Evening));
    }

    #[tokio::test]
    async fn test_month_filter_includes_legacy_rows() {
        let (db, repo) = setup_test().await;
        repo.upsert_entry(&new_entry("2026-01-05", Some(Period::Morning), 0.5))
            .await
            .expect("Failed to insert entry");
        repo.upsert_entry(&new_entry("2026-02-02", Some(Period::Morning), 0.5))
            .await
            .expect("Failed to insert entry");

        // a row written before month/year were denormalized
        sqlx::query("INSERT INTO work_schedules (consultant_id, date, days_worked) VALUES (10, '2026-01-20', 1.0)")
            .execute(db.pool())
            .await
            .expect("Failed to insert legacy row");

        let key = SignatureKey::new(10, 1, 2026);
        let january = repo.list_entries_for_month(&key).await.expect("Failed to list month");
        assert_eq!(january.len(), 2);
        assert!(january.iter().any(|e| e.month.is_none()));

        assert!(repo.first_entry_id_for_month(&key).await.expect("query").is_some());
        let empty = SignatureKey::new(10, 3, 2026);
        assert!(repo.first_entry_id_for_month(&empty).await.expect("query").is_none());
        let other = SignatureKey::new(11, 1, 2026);
        assert!(repo.list_entries_for_month(&other).await.expect("query").is_empty());
    }
}
