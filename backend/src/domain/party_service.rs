use std::sync::Arc;
use tracing::info;

use crate::domain::commands::party::CreateConsultantCommand;
use crate::domain::errors::CraError;
use crate::domain::models::party::{ContactKind, DomainConsultant, DomainContact, NewConsultant};
use crate::storage::PartyStorage;

/// Minimal directory of the parties to a CRA
#[derive(Clone)]
pub struct PartyService {
    parties: Arc<dyn PartyStorage>,
}

impl PartyService {
    pub fn new(parties: Arc<dyn PartyStorage>) -> Self {
        Self { parties }
    }

    pub async fn create_contact(&self, kind: ContactKind, name: &str, email: &str) -> Result<DomainContact, CraError> {
        let name = validate_name(name)?;
        let email = validate_email(email)?;
        let contact = self.parties.create_contact(kind, &name, &email).await?;
        info!("Created {} {} ({})", kind, contact.id, contact.name);
        Ok(contact)
    }

    pub async fn get_contact(&self, kind: ContactKind, id: i64) -> Result<DomainContact, CraError> {
        self.parties
            .get_contact(kind, id)
            .await?
            .ok_or_else(|| CraError::not_found(format!("{} {} not found", kind, id)))
    }

    pub async fn list_contacts(&self, kind: ContactKind) -> Result<Vec<DomainContact>, CraError> {
        Ok(self.parties.list_contacts(kind).await?)
    }

    pub async fn create_consultant(&self, command: CreateConsultantCommand) -> Result<DomainConsultant, CraError> {
        let name = validate_name(&command.name)?;
        let email = validate_email(&command.email)?;
        if let Some(client_id) = command.client_id {
            self.get_contact(ContactKind::Client, client_id).await?;
        }
        if let Some(manager_id) = command.manager_id {
            self.get_contact(ContactKind::Manager, manager_id).await?;
        }

        let consultant = self
            .parties
            .create_consultant(&NewConsultant {
                name,
                email,
                client_id: command.client_id,
                manager_id: command.manager_id,
                project_name: command
                    .project_name
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty()),
            })
            .await?;
        info!("Created consultant {} ({})", consultant.id, consultant.name);
        Ok(consultant)
    }

    pub async fn get_consultant(&self, id: i64) -> Result<DomainConsultant, CraError> {
        self.parties
            .get_consultant(id)
            .await?
            .ok_or_else(|| CraError::not_found(format!("Consultant {} not found", id)))
    }

    pub async fn list_consultants(&self) -> Result<Vec<DomainConsultant>, CraError> {
        Ok(self.parties.list_consultants().await?)
    }
}

fn validate_name(name: &str) -> Result<String, CraError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CraError::validation("Name cannot be empty"));
    }
    if name.len() > 256 {
        return Err(CraError::validation("Name cannot exceed 256 characters"));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> Result<String, CraError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace) => {
            Ok(email.to_string())
        }
        _ => Err(CraError::validation(format!("Invalid email address: {}", email))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;

    async fn setup_test() -> PartyService {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        PartyService::new(Arc::new(db.party_repository()))
    }

    #[tokio::test]
    async fn test_create_consultant_with_parties() {
        let service = setup_test().await;
        let client = service.create_contact(ContactKind::Client, " Acme ", "acme@client.test").await.expect("client");
        assert_eq!(client.name, "Acme");
        let manager = service.create_contact(ContactKind::Manager, "Bea", "bea@firm.test").await.expect("manager");

        let consultant = service
            .create_consultant(CreateConsultantCommand {
                name: "Alice".to_string(),
                email: "alice@firm.test".to_string(),
                client_id: Some(client.id),
                manager_id: Some(manager.id),
                project_name: Some(" ".to_string()),
            })
            .await
            .expect("consultant");
        assert!(consultant.project_name.is_none());
        assert_eq!(service.get_consultant(consultant.id).await.expect("get"), consultant);
        assert_eq!(service.list_consultants().await.expect("list").len(), 1);
        assert_eq!(service.list_contacts(ContactKind::Manager).await.expect("list"), vec![manager]);
    }

    #[tokio::test]
    async fn test_validation_and_missing_parties() {
        let service = setup_test().await;
        assert!(matches!(
            service.create_contact(ContactKind::Client, "", "a@b.test").await,
            Err(CraError::Validation(_))
        ));
        assert!(matches!(
            service.create_contact(ContactKind::Client, "Acme", "not-an-email").await,
            Err(CraError::Validation(_))
        ));

        let orphan = service
            .create_consultant(CreateConsultantCommand {
                name: "Alice".to_string(),
                email: "alice@firm.test".to_string(),
                client_id: Some(42),
                manager_id: None,
                project_name: None,
            })
            .await;
        assert!(matches!(orphan, Err(CraError::NotFound(_))));
        assert!(matches!(service.get_contact(ContactKind::Manager, 1).await, Err(CraError::NotFound(_))));
    }
}
