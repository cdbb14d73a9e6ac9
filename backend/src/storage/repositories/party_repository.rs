use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::party::{ContactKind, DomainConsultant, DomainContact, NewConsultant};
use crate::storage::connection::DbConnection;
use crate::storage::traits::PartyStorage;

/// Repository for consultants, clients and managers
#[derive(Clone)]
pub struct PartyRepository {
    db: DbConnection,
}

impl PartyRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn contact_from_row(row: &SqliteRow) -> Result<DomainContact> {
        Ok(DomainContact {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
        })
    }

    fn consultant_from_row(row: &SqliteRow) -> Result<DomainConsultant> {
        Ok(DomainConsultant {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            client_id: row.try_get("client_id")?,
            manager_id: row.try_get("manager_id")?,
            project_name: row.try_get("project_name")?,
        })
    }
}

#[async_trait]
impl PartyStorage for PartyRepository {
    async fn create_contact(&self, kind: ContactKind, name: &str, email: &str) -> Result<DomainContact> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (name, email, created_at) VALUES (?, ?, ?)",
            kind.table()
        ))
        .bind(name)
        .bind(email)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await?;

        Ok(DomainContact {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    async fn get_contact(&self, kind: ContactKind, id: i64) -> Result<Option<DomainContact>> {
        let row = sqlx::query(&format!("SELECT id, name, email FROM {} WHERE id = ?", kind.table()))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::contact_from_row).transpose()
    }

    async fn list_contacts(&self, kind: ContactKind) -> Result<Vec<DomainContact>> {
        let rows = sqlx::query(&format!("SELECT id, name, email FROM {} ORDER BY name ASC", kind.table()))
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::contact_from_row).collect()
    }

    async fn create_consultant(&self, consultant: &NewConsultant) -> Result<DomainConsultant> {
        let result = sqlx::query(
            r#"
            INSERT INTO consultants (name, email, client_id, manager_id, project_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&consultant.name)
        .bind(&consultant.email)
        .bind(consultant.client_id)
        .bind(consultant.manager_id)
        .bind(&consultant.project_name)
        .bind(Utc::now().to_rfc3339())
        .execute(self.db.pool())
        .await?;

        Ok(DomainConsultant {
            id: result.last_insert_rowid(),
            name: consultant.name.clone(),
            email: consultant.email.clone(),
            client_id: consultant.client_id,
            manager_id: consultant.manager_id,
            project_name: consultant.project_name.clone(),
        })
    }

    async fn get_consultant(&self, id: i64) -> Result<Option<DomainConsultant>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, client_id, manager_id, project_name
            FROM consultants
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::consultant_from_row).transpose()
    }

    async fn list_consultants(&self) -> Result<Vec<DomainConsultant>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, client_id, manager_id, project_name
            FROM consultants
            ORDER BY name ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::consultant_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_parties() {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        let repo = db.party_repository();

        let client = repo
            .create_contact(ContactKind::Client, "Acme", "billing@acme.test")
            .await
            .expect("Failed to create client");
        let manager = repo
            .create_contact(ContactKind::Manager, "Bea", "bea@firm.test")
            .await
            .expect("Failed to create manager");

        let consultant = repo
            .create_consultant(&NewConsultant {
                name: "Alice".to_string(),
                email: "alice@firm.test".to_string(),
                client_id: Some(client.id),
                manager_id: Some(manager.id),
                project_name: Some("Migration".to_string()),
            })
            .await
            .expect("Failed to create consultant");

        let fetched = repo.get_consultant(consultant.id).await.expect("query");
        assert_eq!(fetched, Some(consultant));

        // clients and managers live in separate tables
        assert_eq!(repo.get_contact(ContactKind::Client, client.id).await.expect("query"), Some(client));
        assert_eq!(repo.list_contacts(ContactKind::Manager).await.expect("query"), vec![manager]);
        assert!(repo.get_consultant(999).await.expect("query").is_none());
    }

    #[tokio::test]
    async fn test_consultant_requires_existing_client() {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        let repo = db.party_repository();

        let result = repo
            .create_consultant(&NewConsultant {
                name: "Bob".to_string(),
                email: "bob@firm.test".to_string(),
                client_id: Some(42),
                manager_id: None,
                project_name: None,
            })
            .await;
        assert!(result.is_err());
    }
}
