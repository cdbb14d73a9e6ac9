//! Delivery of fully signed CRAs.
//!
//! The notifier gathers everything the document needs (consultant, client,
//! manager, monthly figures, the three signatures), renders it, and emails it
//! to the parties. Failures never travel back to the signer: they are stored
//! on the record as a failed delivery so an administrator can resend.

use chrono::{Locale, SecondsFormat, Utc};
use serde_json::{json, Value};
use shared::{NotificationStatus, SignerRole};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::document_renderer::{DocumentKind, DocumentRenderer, RenderedDocument};
use crate::domain::email_service::{EmailTemplate, EmailTransport, OutgoingEmail};
use crate::domain::errors::{CraError, NotificationError};
use crate::domain::models::party::{ContactKind, DomainContact};
use crate::domain::models::signature::{LastNotification, SignatureKey, SignatureRecord};
use crate::domain::monthly_aggregator::{aggregate_month, month_label, DomainMonthlySummary};
use crate::storage::{PartyStorage, SignatureStorage, WorkScheduleStorage};

#[derive(Debug, Clone, Copy)]
pub struct NotifierOptions {
    pub notify_consultant: bool,
    pub notify_manager: bool,
    pub locale: Locale,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            notify_consultant: true,
            notify_manager: true,
            locale: Locale::fr_FR,
        }
    }
}

#[derive(Clone)]
pub struct CompletionNotifier {
    parties: Arc<dyn PartyStorage>,
    schedules: Arc<dyn WorkScheduleStorage>,
    signatures: Arc<dyn SignatureStorage>,
    renderer: Arc<dyn DocumentRenderer>,
    transport: Arc<dyn EmailTransport>,
    options: NotifierOptions,
}

impl CompletionNotifier {
    pub fn new(
        parties: Arc<dyn PartyStorage>,
        schedules: Arc<dyn WorkScheduleStorage>,
        signatures: Arc<dyn SignatureStorage>,
        renderer: Arc<dyn DocumentRenderer>,
        transport: Arc<dyn EmailTransport>,
        options: NotifierOptions,
    ) -> Self {
        Self {
            parties,
            schedules,
            signatures,
            renderer,
            transport,
            options,
        }
    }

    /// Render and email a fully signed record, then store the outcome on it.
    ///
    /// Always returns an outcome; delivery problems come back as
    /// [`NotificationStatus::Failed`].
    pub async fn on_fully_signed(&self, record: &SignatureRecord) -> LastNotification {
        let mut recipients = Vec::new();
        let delivery = self.deliver(record, &mut recipients).await;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let outcome = match delivery {
            Ok(()) => {
                info!("Signed CRA for {} sent to {}", record.key, recipients.join(", "));
                LastNotification {
                    status: NotificationStatus::Sent,
                    at: now,
                    recipients,
                    detail: None,
                }
            }
            Err(e) => {
                warn!("Could not deliver signed CRA for {}: {}", record.key, e);
                LastNotification {
                    status: NotificationStatus::Failed,
                    at: now,
                    recipients,
                    detail: Some(e.to_string()),
                }
            }
        };

        if let Err(e) = self.signatures.record_notification(&record.key, &outcome).await {
            warn!("Could not store notification outcome for {}: {}", record.key, e);
        }
        outcome
    }

    /// Retry delivery of an already completed CRA
    pub async fn resend(&self, key: &SignatureKey) -> Result<LastNotification, CraError> {
        let record = self
            .signatures
            .get_record(key)
            .await?
            .filter(SignatureRecord::is_fully_signed)
            .ok_or_else(|| CraError::not_found(format!("No fully signed CRA for {}", key)))?;
        info!("Resending signed CRA for {}", key);
        Ok(self.on_fully_signed(&record).await)
    }

    /// The signed CRA when all parties have signed, otherwise a draft report
    pub async fn render_document(&self, key: &SignatureKey) -> Result<RenderedDocument, CraError> {
        let record = self.signatures.get_record(key).await?;
        let data = self.gather(key, record.as_ref()).await?;
        let kind = match &record {
            Some(record) if record.is_fully_signed() => DocumentKind::SignedCra,
            _ => DocumentKind::MonthlyReport,
        };
        Ok(self.renderer.render(kind, &data)?)
    }

    async fn deliver(&self, record: &SignatureRecord, recipients: &mut Vec<String>) -> Result<(), NotificationError> {
        let data = self
            .gather(&record.key, Some(record))
            .await
            .map_err(|e| NotificationError::Gather(e.into()))?;
        *recipients = self.recipients(&data)?;

        let document = self
            .renderer
            .render(DocumentKind::SignedCra, &data)
            .map_err(NotificationError::Render)?;

        let email = OutgoingEmail {
            template: EmailTemplate::SignedCra,
            data,
            recipients: recipients.clone(),
            attachment: Some(document),
        };
        self.transport.send(&email).await.map_err(NotificationError::Transport)
    }

    /// Build the data bag shared by the document and the email
    async fn gather(&self, key: &SignatureKey, record: Option<&SignatureRecord>) -> Result<Value, CraError> {
        let consultant = self
            .parties
            .get_consultant(key.consultant_id)
            .await?
            .ok_or_else(|| CraError::not_found(format!("Consultant {} not found", key.consultant_id)))?;

        let entries = self.schedules.list_entries_for_month(key).await?;
        if entries.is_empty() && record.is_none() {
            return Err(CraError::not_found(format!("No CRA data for {}", key)));
        }
        let summary = aggregate_month(&entries, key.consultant_id, key.month, key.year)
            .unwrap_or_else(|| DomainMonthlySummary::empty(key.consultant_id, key.month, key.year));

        let client_id = record.and_then(|r| r.client_id).or(consultant.client_id);
        let manager_id = record.and_then(|r| r.manager_id).or(consultant.manager_id);
        let client = self.contact(ContactKind::Client, client_id).await?;
        let manager = self.contact(ContactKind::Manager, manager_id).await?;

        let signatures: Vec<Value> = record
            .map(|record| {
                SignerRole::ALL
                    .iter()
                    .filter_map(|role| {
                        record.slot(*role).map(|slot| {
                            json!({
                                "role": role.as_str(),
                                "signer_id": slot.signer_id,
                                "signed_at": slot.signed_at,
                                "image": slot.data,
                            })
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(json!({
            "consultant": {
                "id": consultant.id,
                "name": consultant.name,
                "email": consultant.email,
                "project_name": consultant.project_name,
            },
            "client": client.map(contact_json),
            "manager": manager.map(contact_json),
            "period": {
                "month": key.month,
                "year": key.year,
                "label": month_label(key.year, key.month, self.options.locale),
            },
            "summary": {
                "days_worked": summary.days_worked,
                "weekend_worked": summary.weekend_worked,
                "absence_days": summary.absence_days,
                "work_type_days": summary.work_type_days,
                "absence_types": summary.absence_types.join(", "),
                "work_types": summary.work_types.join(", "),
            },
            "signatures": signatures,
            "completed_at": record.and_then(|r| r.completed_at.clone()),
        }))
    }

    async fn contact(&self, kind: ContactKind, id: Option<i64>) -> Result<Option<DomainContact>, CraError> {
        match id {
            Some(id) => Ok(self.parties.get_contact(kind, id).await?),
            None => Ok(None),
        }
    }

    /// Client is mandatory; consultant and manager follow the options
    fn recipients(&self, data: &Value) -> Result<Vec<String>, NotificationError> {
        let client = email_of(&data["client"])
            .ok_or_else(|| NotificationError::MissingRecipient("client has no email address".to_string()))?;

        let mut recipients = vec![client];
        if self.options.notify_consultant {
            recipients.extend(email_of(&data["consultant"]));
        }
        if self.options.notify_manager {
            recipients.extend(email_of(&data["manager"]));
        }

        let mut seen = std::collections::HashSet::new();
        recipients.retain(|email| seen.insert(email.to_ascii_lowercase()));
        Ok(recipients)
    }
}

fn contact_json(contact: DomainContact) -> Value {
    json!({ "id": contact.id, "name": contact.name, "email": contact.email })
}

fn email_of(party: &Value) -> Option<String> {
    party["email"]
        .as_str()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(String::from)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::document_renderer::HtmlDocumentRenderer;
    use crate::domain::models::party::NewConsultant;
    use crate::domain::models::signature::{SignatureSlot, SlotWrite};
    use crate::domain::models::work_schedule::NewWorkScheduleEntry;
    use crate::storage::DbConnection;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Transport that records what it was asked to send
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub calls: AtomicUsize,
        pub fail: AtomicBool,
        pub sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl EmailTransport for RecordingTransport {
        async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow::anyhow!("SMTP relay refused connection"));
            }
            self.sent.lock().expect("lock").push(email.clone());
            Ok(())
        }
    }

    pub(crate) struct Fixture {
        pub db: DbConnection,
        pub consultant_id: i64,
        pub client_id: i64,
        pub manager_id: i64,
    }

    pub(crate) async fn fixture() -> Fixture {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        fixture_on(db).await
    }

    /// Consultant 'Alice' placed at 'Acme' and managed by 'Bea', with one
    /// January 2026 schedule row
    pub(crate) async fn fixture_on(db: DbConnection) -> Fixture {
        let parties = db.party_repository();
        let client = parties
            .create_contact(ContactKind::Client, "Acme", "acme@client.test")
            .await
            .expect("client");
        let manager = parties
            .create_contact(ContactKind::Manager, "Bea", "bea@firm.test")
            .await
            .expect("manager");
        let consultant = parties
            .create_consultant(&NewConsultant {
                name: "Alice".to_string(),
                email: "alice@firm.test".to_string(),
                client_id: Some(client.id),
                manager_id: Some(manager.id),
                project_name: Some("Migration".to_string()),
            })
            .await
            .expect("consultant");

        db.work_schedule_repository()
            .upsert_entry(&NewWorkScheduleEntry {
                consultant_id: consultant.id,
                date: NaiveDate::from_ymd_opt(2026, 1, 5).expect("date"),
                period: None,
                work_type: None,
                leave_type: None,
                legacy_type: None,
                legacy_absence_type: None,
                days_worked: 1.0,
                weekend_worked: 0.0,
                absence_days: 0.0,
                work_type_days: 0.0,
            })
            .await
            .expect("entry");

        Fixture {
            db,
            consultant_id: consultant.id,
            client_id: client.id,
            manager_id: manager.id,
        }
    }

    pub(crate) fn notifier(db: &DbConnection, transport: Arc<RecordingTransport>, options: NotifierOptions) -> CompletionNotifier {
        CompletionNotifier::new(
            Arc::new(db.party_repository()),
            Arc::new(db.work_schedule_repository()),
            Arc::new(db.signature_repository()),
            Arc::new(HtmlDocumentRenderer::new()),
            transport,
            options,
        )
    }

    async fn sign_all(f: &Fixture, key: &SignatureKey) -> SignatureRecord {
        let repo = f.db.signature_repository();
        let mut last = None;
        for (role, signer) in [
            (SignerRole::Consultant, f.consultant_id),
            (SignerRole::Client, f.client_id),
            (SignerRole::Manager, f.manager_id),
        ] {
            let write = SlotWrite {
                role,
                slot: SignatureSlot {
                    data: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                    signed_at: "2026-02-01T10:00:00Z".to_string(),
                    signer_id: signer,
                },
                work_schedule_id: None,
                client_id: Some(f.client_id),
                manager_id: Some(f.manager_id),
            };
            last = Some(repo.write_slot(key, &write).await.expect("write").record);
        }
        last.expect("record")
    }

    #[tokio::test]
    async fn test_on_fully_signed_sends_and_records() {
        let f = fixture().await;
        let key = SignatureKey::new(f.consultant_id, 1, 2026);
        let record = sign_all(&f, &key).await;
        let transport = Arc::new(RecordingTransport::default());
        let notifier = notifier(&f.db, transport.clone(), NotifierOptions::default());

        let outcome = notifier.on_fully_signed(&record).await;

        assert_eq!(outcome.status, NotificationStatus::Sent);
        assert_eq!(outcome.recipients, vec!["acme@client.test", "alice@firm.test", "bea@firm.test"]);
        let sent = transport.sent.lock().expect("lock");
        let attachment = sent[0].attachment.as_ref().expect("attachment");
        assert!(attachment.file_name.starts_with("cra-signe-alice"));
        assert_eq!(sent[0].data["period"]["label"], "janvier 2026");

        let stored = f.db.signature_repository().get_record(&key).await.expect("get").expect("record");
        assert_eq!(stored.last_notification.expect("notification").status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn test_transport_failure_is_recorded_not_raised() {
        let f = fixture().await;
        let key = SignatureKey::new(f.consultant_id, 1, 2026);
        let record = sign_all(&f, &key).await;
        let transport = Arc::new(RecordingTransport::default());
        transport.fail.store(true, Ordering::SeqCst);
        let notifier = notifier(&f.db, transport.clone(), NotifierOptions::default());

        let outcome = notifier.on_fully_signed(&record).await;
        assert_eq!(outcome.status, NotificationStatus::Failed);
        assert!(outcome.detail.expect("detail").contains("refused"));

        transport.fail.store(false, Ordering::SeqCst);
        let resent = notifier.resend(&key).await.expect("resend");
        assert_eq!(resent.status, NotificationStatus::Sent);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_recipient_options() {
        let f = fixture().await;
        let key = SignatureKey::new(f.consultant_id, 1, 2026);
        let record = sign_all(&f, &key).await;
        let transport = Arc::new(RecordingTransport::default());
        let options = NotifierOptions {
            notify_consultant: false,
            notify_manager: false,
            ..NotifierOptions::default()
        };

        let outcome = notifier(&f.db, transport, options).on_fully_signed(&record).await;
        assert_eq!(outcome.recipients, vec!["acme@client.test"]);
    }

    #[tokio::test]
    async fn test_resend_requires_fully_signed_record() {
        let f = fixture().await;
        let notifier = notifier(&f.db, Arc::new(RecordingTransport::default()), NotifierOptions::default());
        let result = notifier.resend(&SignatureKey::new(f.consultant_id, 1, 2026)).await;
        assert!(matches!(result, Err(CraError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_render_document_draft_then_signed() {
        let f = fixture().await;
        let key = SignatureKey::new(f.consultant_id, 1, 2026);
        let notifier = notifier(&f.db, Arc::new(RecordingTransport::default()), NotifierOptions::default());

        let draft = notifier.render_document(&key).await.expect("draft");
        assert!(draft.file_name.starts_with("cra-alice"));

        sign_all(&f, &key).await;
        let signed = notifier.render_document(&key).await.expect("signed");
        assert!(signed.file_name.starts_with("cra-signe-alice"));

        let empty = notifier.render_document(&SignatureKey::new(f.consultant_id, 2, 2026)).await;
        assert!(matches!(empty, Err(CraError::NotFound(_))));
    }
}
