//! Reusable signature store.
//!
//! Users keep a history of signatures they drew so a new signing session can
//! start from the last one. The history is append-only and scoped to the
//! caller; it has no link to any CRA signature record.

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::info;

use crate::domain::commands::reusable_signature::SaveSignatureCommand;
use crate::domain::errors::CraError;
use crate::domain::models::party::ContactKind;
use crate::domain::models::signature::Actor;
use crate::domain::models::stored_signature::DomainStoredSignature;
use crate::domain::signature_image::SignatureImage;
use crate::storage::{PartyStorage, StoredSignatureStorage};

#[derive(Clone)]
pub struct ReusableSignatureService {
    store: Arc<dyn StoredSignatureStorage>,
    parties: Arc<dyn PartyStorage>,
    max_image_bytes: usize,
}

impl ReusableSignatureService {
    pub fn new(store: Arc<dyn StoredSignatureStorage>, parties: Arc<dyn PartyStorage>, max_image_bytes: usize) -> Self {
        Self {
            store,
            parties,
            max_image_bytes,
        }
    }

    /// Append a signature to the caller's history
    pub async fn save_signature(&self, command: SaveSignatureCommand) -> Result<DomainStoredSignature, CraError> {
        let image = SignatureImage::parse(&command.signature_image, self.max_image_bytes)?;
        let context = command.context;
        if let Some(month) = context.month {
            if !(1..=12).contains(&month) {
                return Err(CraError::validation(format!("Invalid month: {}", month)));
            }
        }

        let (user_name, user_email) = self.snapshot(&command.actor).await?;
        let signature = DomainStoredSignature {
            id: DomainStoredSignature::generate_id(),
            user_type: command.actor.role(),
            user_id: command.actor.id(),
            user_name,
            user_email,
            signature_data: image.into_data_url(),
            signed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            document_type: normalize_document_type(context.document_type.as_deref()),
            document_id: context.document_id,
            consultant_id: context.consultant_id,
            month: context.month,
            year: context.year,
        };

        self.store.append_signature(&signature).await?;
        info!("Saved reusable signature {} for {}", signature.id, command.actor);
        Ok(signature)
    }

    /// Most recent signature of the caller, optionally for one document type
    pub async fn get_latest_signature(
        &self,
        actor: &Actor,
        document_type: Option<&str>,
    ) -> Result<Option<DomainStoredSignature>, CraError> {
        let document_type = normalize_document_type(document_type);
        Ok(self
            .store
            .latest_signature(actor.role(), actor.id(), document_type.as_deref())
            .await?)
    }

    pub async fn list_history(&self, actor: &Actor) -> Result<Vec<DomainStoredSignature>, CraError> {
        Ok(self.store.list_signatures(actor.role(), actor.id()).await?)
    }

    /// Name and email of the actor when the directory knows them
    async fn snapshot(&self, actor: &Actor) -> Result<(Option<String>, Option<String>), CraError> {
        let found = match actor {
            Actor::Consultant(id) => self.parties.get_consultant(*id).await?.map(|c| (c.name, c.email)),
            Actor::Client(id) => self
                .parties
                .get_contact(ContactKind::Client, *id)
                .await?
                .map(|c| (c.name, c.email)),
            Actor::Manager(id) => self
                .parties
                .get_contact(ContactKind::Manager, *id)
                .await?
                .map(|c| (c.name, c.email)),
        };
        Ok(found.map_or((None, None), |(name, email)| (Some(name), Some(email))))
    }
}

fn normalize_document_type(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(|s| s.to_ascii_uppercase())
}
