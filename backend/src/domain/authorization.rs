//! Who may act on a consultant's CRA.
//!
//! A consultant acts on their own CRA, a client on the CRAs of consultants
//! placed with them, a manager on the CRAs of consultants they manage.
//! Establishing *who the caller is* belongs to the auth layer in front of the
//! service; this module only decides whether that identity is a party.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::domain::errors::CraError;
use crate::domain::models::party::DomainConsultant;
use crate::domain::models::signature::Actor;
use crate::storage::PartyStorage;

#[async_trait]
pub trait SigningAuthority: Send + Sync {
    /// Resolve the consultant and check the actor is one of its parties
    async fn authorize(&self, actor: &Actor, consultant_id: i64) -> Result<DomainConsultant, CraError>;
}

/// Whether `actor` is a legitimate party to `consultant`'s CRAs
pub fn may_sign(actor: &Actor, consultant: &DomainConsultant) -> bool {
    match actor {
        Actor::Consultant(id) => *id == consultant.id,
        Actor::Client(id) => consultant.client_id == Some(*id),
        Actor::Manager(id) => consultant.manager_id == Some(*id),
    }
}

/// Authority backed by the party directory
#[derive(Clone)]
pub struct DirectoryAuthority {
    parties: Arc<dyn PartyStorage>,
}

impl DirectoryAuthority {
    pub fn new(parties: Arc<dyn PartyStorage>) -> Self {
        Self { parties }
    }
}

#[async_trait]
impl SigningAuthority for DirectoryAuthority {
    async fn authorize(&self, actor: &Actor, consultant_id: i64) -> Result<DomainConsultant, CraError> {
        let consultant = self
            .parties
            .get_consultant(consultant_id)
            .await?
            .ok_or_else(|| CraError::not_found(format!("Consultant {} not found", consultant_id)))?;

        if !may_sign(actor, &consultant) {
            warn!("Rejected {} acting on consultant {}", actor, consultant_id);
            return Err(CraError::forbidden(format!(
                "{} is not a party to consultant {}'s CRA",
                actor, consultant_id
            )));
        }
        Ok(consultant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::party::{ContactKind, NewConsultant};
    use crate::storage::DbConnection;

    fn consultant() -> DomainConsultant {
        DomainConsultant {
            id: 10,
            name: "Alice".to_string(),
            email: "alice@firm.test".to_string(),
            client_id: Some(3),
            manager_id: Some(7),
            project_name: None,
        }
    }

    #[test]
    fn test_may_sign_matrix() {
        let c = consultant();
        assert!(may_sign(&Actor::Consultant(10), &c));
        assert!(!may_sign(&Actor::Consultant(11), &c));
        assert!(may_sign(&Actor::Client(3), &c));
        assert!(!may_sign(&Actor::Client(4), &c));
        assert!(may_sign(&Actor::Manager(7), &c));
        assert!(!may_sign(&Actor::Manager(3), &c));

        let unplaced = DomainConsultant { client_id: None, manager_id: None, ..consultant() };
        assert!(!may_sign(&Actor::Client(3), &unplaced));
        assert!(!may_sign(&Actor::Manager(7), &unplaced));
    }

    #[tokio::test]
    async fn test_directory_authority() {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        let parties = Arc::new(db.party_repository());
        let client = parties.create_contact(ContactKind::Client, "Acme", "acme@test").await.expect("client");
        let consultant = parties
            .create_consultant(&NewConsultant {
                name: "Alice".to_string(),
                email: "alice@firm.test".to_string(),
                client_id: Some(client.id),
                manager_id: None,
                project_name: None,
            })
            .await
            .expect("consultant");
        let authority = DirectoryAuthority::new(parties);

        let resolved = authority.authorize(&Actor::Client(client.id), consultant.id).await.expect("authorized");
        assert_eq!(resolved.id, consultant.id);

        let forbidden = authority.authorize(&Actor::Client(client.id + 1), consultant.id).await;
        assert!(matches!(forbidden, Err(CraError::Forbidden(_))));

        let missing = authority.authorize(&Actor::Consultant(99), 99).await;
        assert!(matches!(missing, Err(CraError::NotFound(_))));
    }
}
