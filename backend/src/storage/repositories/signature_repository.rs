use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use shared::{NotificationStatus, SignerRole};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::signature::{
    LastNotification, SignatureKey, SignatureRecord, SignatureSlot, SlotWrite, SlotWriteOutcome,
};
use crate::storage::connection::DbConnection;
use crate::storage::traits::SignatureStorage;

const RECORD_COLUMNS: &str = r#"
    id, consultant_id, month, year, work_schedule_id, client_id, manager_id,
    consultant_signature, consultant_signed_at, consultant_signer_id,
    client_signature, client_signed_at, client_signer_id,
    manager_signature, manager_signed_at, manager_signer_id,
    completed_at, notification_status, notification_recipients,
    notification_detail, notified_at, created_at, updated_at
"#;

/// Column triple (image, timestamp, signer) backing one slot
fn slot_columns(role: SignerRole) -> (&'static str, &'static str, &'static str) {
    match role {
        SignerRole::Consultant => ("consultant_signature", "consultant_signed_at", "consultant_signer_id"),
        SignerRole::Client => ("client_signature", "client_signed_at", "client_signer_id"),
        SignerRole::Manager => ("manager_signature", "manager_signed_at", "manager_signer_id"),
    }
}

fn notification_status_to_column(status: NotificationStatus) -> &'static str {
    match status {
        NotificationStatus::NotTriggered => "not_triggered",
        NotificationStatus::Sent => "sent",
        NotificationStatus::Failed => "failed",
    }
}

fn notification_status_from_column(value: &str) -> Option<NotificationStatus> {
    match value {
        "not_triggered" => Some(NotificationStatus::NotTriggered),
        "sent" => Some(NotificationStatus::Sent),
        "failed" => Some(NotificationStatus::Failed),
        _ => None,
    }
}

/// Repository for per-month signature records
#[derive(Clone)]
pub struct SignatureRepository {
    db: DbConnection,
}

impl SignatureRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn slot_from_row(row: &SqliteRow, role: SignerRole) -> Result<Option<SignatureSlot>> {
        let (data_col, at_col, signer_col) = slot_columns(role);
        let data: Option<String> = row.try_get(data_col)?;
        let signed_at: Option<String> = row.try_get(at_col)?;
        let signer_id: Option<i64> = row.try_get(signer_col)?;

        Ok(match (data, signed_at, signer_id) {
            (Some(data), Some(signed_at), Some(signer_id)) => Some(SignatureSlot { data, signed_at, signer_id }),
            _ => None,
        })
    }

    fn record_from_row(row: &SqliteRow) -> Result<SignatureRecord> {
        let month: i64 = row.try_get("month")?;
        let year: i64 = row.try_get("year")?;
        let key = SignatureKey::new(
            row.try_get("consultant_id")?,
            u32::try_from(month).context("month out of range")?,
            i32::try_from(year).context("year out of range")?,
        );

        let status: Option<String> = row.try_get("notification_status")?;
        let notified_at: Option<String> = row.try_get("notified_at")?;
        let last_notification = match (status.as_deref().and_then(notification_status_from_column), notified_at) {
            (Some(status), Some(at)) => {
                let recipients: Option<String> = row.try_get("notification_recipients")?;
                Some(LastNotification {
                    status,
                    at,
                    recipients: recipients
                        .map(|r| r.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect())
                        .unwrap_or_default(),
                    detail: row.try_get("notification_detail")?,
                })
            }
            _ => None,
        };

        Ok(SignatureRecord {
            id: row.try_get("id")?,
            key,
            consultant_signature: Self::slot_from_row(row, SignerRole::Consultant)?,
            client_signature: Self::slot_from_row(row, SignerRole::Client)?,
            manager_signature: Self::slot_from_row(row, SignerRole::Manager)?,
            work_schedule_id: row.try_get("work_schedule_id")?,
            client_id: row.try_get("client_id")?,
            manager_id: row.try_get("manager_id")?,
            completed_at: row.try_get("completed_at")?,
            last_notification,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl SignatureStorage for SignatureRepository {
    async fn get_record(&self, key: &SignatureKey) -> Result<Option<SignatureRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM signature_records WHERE consultant_id = ? AND month = ? AND year = ?",
            RECORD_COLUMNS
        ))
        .bind(key.consultant_id)
        .bind(key.month as i64)
        .bind(key.year as i64)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn list_records(&self, consultant_id: i64) -> Result<Vec<SignatureRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM signature_records WHERE consultant_id = ? ORDER BY year ASC, month ASC",
            RECORD_COLUMNS
        ))
        .bind(consultant_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn write_slot(&self, key: &SignatureKey, write: &SlotWrite) -> Result<SlotWriteOutcome> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let (data_col, at_col, signer_col) = slot_columns(write.role);

        // The first statement is a write so the transaction holds the writer
        // lock before anything is read; concurrent writers queue on busy_timeout
        // instead of racing between the slot update and the completion claim.
        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO signature_records (consultant_id, month, year, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(key.consultant_id)
        .bind(key.month as i64)
        .bind(key.year as i64)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(&format!(
            r#"
            UPDATE signature_records
            SET {data_col} = ?, {at_col} = ?, {signer_col} = ?,
                work_schedule_id = COALESCE(work_schedule_id, ?),
                client_id = COALESCE(?, client_id),
                manager_id = COALESCE(?, manager_id),
                updated_at = ?
            WHERE consultant_id = ? AND month = ? AND year = ?
            "#
        ))
        .bind(&write.slot.data)
        .bind(&write.slot.signed_at)
        .bind(write.slot.signer_id)
        .bind(write.work_schedule_id)
        .bind(write.client_id)
        .bind(write.manager_id)
        .bind(&now)
        .bind(key.consultant_id)
        .bind(key.month as i64)
        .bind(key.year as i64)
        .execute(&mut *tx)
        .await?;

        // completed_at is the idempotency claim: only one write can move it
        // from NULL, and nothing ever clears it.
        let claimed = sqlx::query(
            r#"
            UPDATE signature_records
            SET completed_at = ?
            WHERE consultant_id = ? AND month = ? AND year = ?
              AND completed_at IS NULL
              AND consultant_signature IS NOT NULL
              AND client_signature IS NOT NULL
              AND manager_signature IS NOT NULL
            "#,
        )
        .bind(&now)
        .bind(key.consultant_id)
        .bind(key.month as i64)
        .bind(key.year as i64)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let row = sqlx::query(&format!(
            "SELECT {} FROM signature_records WHERE consultant_id = ? AND month = ? AND year = ?",
            RECORD_COLUMNS
        ))
        .bind(key.consultant_id)
        .bind(key.month as i64)
        .bind(key.year as i64)
        .fetch_one(&mut *tx)
        .await?;
        let record = Self::record_from_row(&row)?;

        tx.commit().await?;

        Ok(SlotWriteOutcome {
            record,
            completed_now: claimed,
        })
    }

    async fn record_notification(&self, key: &SignatureKey, notification: &LastNotification) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE signature_records
            SET notification_status = ?, notification_recipients = ?,
                notification_detail = ?, notified_at = ?
            WHERE consultant_id = ? AND month = ? AND year = ?
            "#,
        )
        .bind(notification_status_to_column(notification.status))
        .bind(notification.recipients.join(","))
        .bind(&notification.detail)
        .bind(&notification.at)
        .bind(key.consultant_id)
        .bind(key.month as i64)
        .bind(key.year as i64)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
