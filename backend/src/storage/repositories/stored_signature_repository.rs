use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::SignerRole;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::stored_signature::DomainStoredSignature;
use crate::storage::connection::DbConnection;
use crate::storage::traits::StoredSignatureStorage;

const SIGNATURE_COLUMNS: &str = r#"
    id, user_type, user_id, user_name, user_email, signature_data, signed_at,
    document_type, document_id, consultant_id, month, year
"#;

/// Repository for the reusable signature history
#[derive(Clone)]
pub struct StoredSignatureRepository {
    db: DbConnection,
}

impl StoredSignatureRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn signature_from_row(row: &SqliteRow) -> Result<DomainStoredSignature> {
        let user_type: String = row.try_get("user_type")?;
        let month: Option<i64> = row.try_get("month")?;
        let year: Option<i64> = row.try_get("year")?;

        Ok(DomainStoredSignature {
            id: row.try_get("id")?,
            user_type: SignerRole::parse(&user_type)
                .ok_or_else(|| anyhow!("Unknown signer type in storage: {}", user_type))?,
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
            user_email: row.try_get("user_email")?,
            signature_data: row.try_get("signature_data")?,
            signed_at: row.try_get("signed_at")?,
            document_type: row.try_get("document_type")?,
            document_id: row.try_get("document_id")?,
            consultant_id: row.try_get("consultant_id")?,
            month: month.and_then(|m| u32::try_from(m).ok()),
            year: year.and_then(|y| i32::try_from(y).ok()),
        })
    }
}

#[async_trait]
impl StoredSignatureStorage for StoredSignatureRepository {
    async fn append_signature(&self, signature: &DomainStoredSignature) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stored_signatures (
                id, user_type, user_id, user_name, user_email, signature_data, signed_at,
                document_type, document_id, consultant_id, month, year
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&signature.id)
        .bind(signature.user_type.as_str())
        .bind(signature.user_id)
        .bind(&signature.user_name)
        .bind(&signature.user_email)
        .bind(&signature.signature_data)
        .bind(&signature.signed_at)
        .bind(&signature.document_type)
        .bind(signature.document_id)
        .bind(signature.consultant_id)
        .bind(signature.month.map(i64::from))
        .bind(signature.year.map(i64::from))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn latest_signature(
        &self,
        user_type: SignerRole,
        user_id: i64,
        document_type: Option<&str>,
    ) -> Result<Option<DomainStoredSignature>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM stored_signatures
            WHERE user_type = ? AND user_id = ? AND (? IS NULL OR document_type = ?)
            ORDER BY signed_at DESC, rowid DESC
            LIMIT 1
            "#,
            SIGNATURE_COLUMNS
        ))
        .bind(user_type.as_str())
        .bind(user_id)
        .bind(document_type)
        .bind(document_type)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::signature_from_row).transpose()
    }

    async fn list_signatures(&self, user_type: SignerRole, user_id: i64) -> Result<Vec<DomainStoredSignature>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM stored_signatures
            WHERE user_type = ? AND user_id = ?
            ORDER BY signed_at DESC, rowid DESC
            "#,
            SIGNATURE_COLUMNS
        ))
        .bind(user_type.as_str())
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::signature_from_row).collect()
    }
}
