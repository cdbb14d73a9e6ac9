//! Signature workflow controller.
//!
//! Each (consultant, month, year) key has three independent slots that only
//! ever go from empty to filled. A submission is validated and authorized
//! before anything is written; the slot write and the completion claim happen
//! in a single storage transaction, so the completion notifier runs exactly
//! once per key no matter how submissions interleave.
//!
//! Re-submitting a filled slot replaces its image, signer and timestamp. A
//! correction after completion does not notify again.

use chrono::{SecondsFormat, Utc};
use shared::SignerRole;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::authorization::SigningAuthority;
use crate::domain::commands::signature::{
    ResendNotificationResult, SubmitSignatureCommand, SubmitSignatureResult,
};
use crate::domain::completion_notifier::CompletionNotifier;
use crate::domain::document_renderer::RenderedDocument;
use crate::domain::errors::CraError;
use crate::domain::models::signature::{Actor, SignatureKey, SignatureRecord, SignatureSlot, SlotWrite};
use crate::domain::signature_image::{SignatureImage, DEFAULT_MAX_IMAGE_BYTES};
use crate::storage::{SignatureStorage, WorkScheduleStorage};

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy)]
pub struct SigningPolicy {
    /// Refuse to sign a month without any schedule rows
    pub require_schedule_data: bool,
    pub max_image_bytes: usize,
}

impl Default for SigningPolicy {
    fn default() -> Self {
        Self {
            require_schedule_data: true,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// Build a key after checking month and year are in range
pub fn validate_key(consultant_id: i64, month: u32, year: i32) -> Result<SignatureKey, CraError> {
    if !(1..=12).contains(&month) {
        return Err(CraError::validation(format!("Invalid month: {}", month)));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(CraError::validation(format!(
            "Invalid year: {} (expected {} to {})",
            year, MIN_YEAR, MAX_YEAR
        )));
    }
    Ok(SignatureKey::new(consultant_id, month, year))
}

#[derive(Clone)]
pub struct SignatureWorkflowService {
    signatures: Arc<dyn SignatureStorage>,
    schedules: Arc<dyn WorkScheduleStorage>,
    authority: Arc<dyn SigningAuthority>,
    notifier: CompletionNotifier,
    policy: SigningPolicy,
}

impl SignatureWorkflowService {
    pub fn new(
        signatures: Arc<dyn SignatureStorage>,
        schedules: Arc<dyn WorkScheduleStorage>,
        authority: Arc<dyn SigningAuthority>,
        notifier: CompletionNotifier,
        policy: SigningPolicy,
    ) -> Self {
        Self {
            signatures,
            schedules,
            authority,
            notifier,
            policy,
        }
    }

    /// Fill the actor's slot and notify if this write completed the CRA
    pub async fn submit_signature(&self, command: SubmitSignatureCommand) -> Result<SubmitSignatureResult, CraError> {
        let actor = command.actor;
        info!(
            "Signature submission by {} for consultant {} {:04}-{:02}",
            actor, command.consultant_id, command.year, command.month
        );

        let key = validate_key(command.consultant_id, command.month, command.year)?;
        let image = SignatureImage::parse(&command.signature_image, self.policy.max_image_bytes)?;
        let consultant = self.authority.authorize(&actor, key.consultant_id).await?;
        debug!("Accepted {} signature image of {} bytes for {}", image.mime(), image.size(), key);

        let work_schedule_id = self.schedules.first_entry_id_for_month(&key).await?;
        if self.policy.require_schedule_data && work_schedule_id.is_none() {
            return Err(CraError::not_found(format!("No schedule data to sign for {}", key)));
        }

        let write = SlotWrite {
            role: actor.role(),
            slot: SignatureSlot {
                data: image.into_data_url(),
                signed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                signer_id: actor.id(),
            },
            work_schedule_id,
            client_id: consultant.client_id,
            manager_id: consultant.manager_id,
        };
        let outcome = self.signatures.write_slot(&key, &write).await?;
        info!("Stored {} signature for {}", write.role, key);

        if !outcome.completed_now {
            return Ok(SubmitSignatureResult {
                record: outcome.record,
                notification: None,
            });
        }

        info!("CRA {} is fully signed, notifying parties", key);
        let notification = self.notifier.on_fully_signed(&outcome.record).await;
        let record = self.signatures.get_record(&key).await?.unwrap_or(outcome.record);

        Ok(SubmitSignatureResult {
            record,
            notification: Some(notification),
        })
    }

    pub async fn get_signature_record(&self, actor: &Actor, key: SignatureKey) -> Result<Option<SignatureRecord>, CraError> {
        let key = validate_key(key.consultant_id, key.month, key.year)?;
        self.authority.authorize(actor, key.consultant_id).await?;
        Ok(self.signatures.get_record(&key).await?)
    }

    /// Administrative re-send, restricted to the consultant's manager
    pub async fn resend_completion_notification(
        &self,
        actor: &Actor,
        key: SignatureKey,
    ) -> Result<ResendNotificationResult, CraError> {
        let key = validate_key(key.consultant_id, key.month, key.year)?;
        if actor.role() != SignerRole::Manager {
            return Err(CraError::forbidden("Only the consultant's manager can resend a signed CRA"));
        }
        self.authority.authorize(actor, key.consultant_id).await?;

        let notification = self.notifier.resend(&key).await?;
        let record = self
            .signatures
            .get_record(&key)
            .await?
            .ok_or_else(|| CraError::not_found(format!("No CRA record for {}", key)))?;
        Ok(ResendNotificationResult { record, notification })
    }

    /// Downloadable CRA for any party of the consultant
    pub async fn cra_document(&self, actor: &Actor, key: SignatureKey) -> Result<RenderedDocument, CraError> {
        let key = validate_key(key.consultant_id, key.month, key.year)?;
        self.authority.authorize(actor, key.consultant_id).await?;
        self.notifier.render_document(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::authorization::DirectoryAuthority;
    use crate::domain::completion_notifier::tests::{fixture, fixture_on, notifier, Fixture, RecordingTransport};
    use crate::domain::completion_notifier::NotifierOptions;
    use crate::domain::models::work_schedule::NewWorkScheduleEntry;
    use crate::domain::signature_image::test_png;
    use crate::storage::DbConnection;
    use chrono::NaiveDate;
    use shared::NotificationStatus;
    use std::sync::atomic::Ordering;

    fn service(f: &Fixture, transport: Arc<RecordingTransport>, policy: SigningPolicy) -> SignatureWorkflowService {
        SignatureWorkflowService::new(
            Arc::new(f.db.signature_repository()),
            Arc::new(f.db.work_schedule_repository()),
            Arc::new(DirectoryAuthority::new(Arc::new(f.db.party_repository()))),
            notifier(&f.db, transport, NotifierOptions::default()),
            policy,
        )
    }

    fn submit(actor: Actor, consultant_id: i64, month: u32, marker: &str) -> SubmitSignatureCommand {
        SubmitSignatureCommand {
            actor,
            consultant_id,
            month,
            year: 2026,
            signature_image: test_png(marker),
        }
    }

    async fn add_entry(f: &Fixture, date: NaiveDate, days: f64, weekend: f64, absence: f64, absence_type: Option<&str>) {
        f.db.work_schedule_repository()
            .upsert_entry(&NewWorkScheduleEntry {
                consultant_id: f.consultant_id,
                date,
                period: None,
                work_type: None,
                leave_type: None,
                legacy_type: None,
                legacy_absence_type: absence_type.map(String::from),
                days_worked: days,
                weekend_worked: weekend,
                absence_days: absence,
                work_type_days: 0.0,
            })
            .await
            .expect("entry");
    }

    #[tokio::test]
    async fn test_january_scenario() {
        let f = fixture().await;
        // fixture already holds 2026-01-05 with one day worked
        for day in 6..=22 {
            add_entry(&f, NaiveDate::from_ymd_opt(2026, 1, day).expect("date"), 1.0, 0.0, 0.0, None).await;
        }
        add_entry(&f, NaiveDate::from_ymd_opt(2026, 1, 24).expect("date"), 0.0, 1.0, 0.0, None).await;
        add_entry(&f, NaiveDate::from_ymd_opt(2026, 1, 25).expect("date"), 0.0, 1.0, 0.0, None).await;
        add_entry(&f, NaiveDate::from_ymd_opt(2026, 1, 26).expect("date"), 0.0, 0.0, 1.0, Some("sick")).await;

        let entries = f.db.work_schedule_repository().list_entries(f.consultant_id).await.expect("entries");
        let summaries = crate::domain::monthly_aggregator::aggregate(&entries);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].days_worked, 18.0);
        assert_eq!(summaries[0].weekend_worked, 2.0);
        assert_eq!(summaries[0].absence_days, 1.0);
        assert_eq!(summaries[0].absence_types, vec!["Sick"]);

        let transport = Arc::new(RecordingTransport::default());
        let service = service(&f, transport.clone(), SigningPolicy::default());

        let first = service
            .submit_signature(submit(Actor::Consultant(f.consultant_id), f.consultant_id, 1, "c"))
            .await
            .expect("consultant signs");
        assert!(first.record.consultant_signature.is_some());
        assert!(first.record.client_signature.is_none());
        assert!(!first.record.is_fully_signed());
        assert!(first.notification.is_none());

        let second = service
            .submit_signature(submit(Actor::Client(f.client_id), f.consultant_id, 1, "k"))
            .await
            .expect("client signs");
        assert!(!second.record.is_fully_signed());
        assert!(second.notification.is_none());

        let third = service
            .submit_signature(submit(Actor::Manager(f.manager_id), f.consultant_id, 1, "m"))
            .await
            .expect("manager signs");
        assert!(third.record.is_fully_signed());
        assert!(third.record.completed_at.is_some());
        assert_eq!(third.notification.expect("notified").status, NotificationStatus::Sent);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            third.record.last_notification.expect("stored").status,
            NotificationStatus::Sent
        );
        let sent = transport.sent.lock().expect("lock");
        assert_eq!(sent[0].data["summary"]["days_worked"], 18.0);
        assert_eq!(sent[0].data["summary"]["absence_types"], "Sick");
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_signatures() {
        let f = fixture().await;
        let transport = Arc::new(RecordingTransport::default());
        transport.fail.store(true, Ordering::SeqCst);
        let service = service(&f, transport.clone(), SigningPolicy::default());

        for actor in [Actor::Consultant(f.consultant_id), Actor::Client(f.client_id)] {
            service.submit_signature(submit(actor, f.consultant_id, 1, "x")).await.expect("sign");
        }
        let result = service
            .submit_signature(submit(Actor::Manager(f.manager_id), f.consultant_id, 1, "m"))
            .await
            .expect("manager signs despite transport failure");

        assert!(result.record.is_fully_signed());
        assert_eq!(result.notification.expect("outcome").status, NotificationStatus::Failed);

        let key = SignatureKey::new(f.consultant_id, 1, 2026);
        let stored = service
            .get_signature_record(&Actor::Consultant(f.consultant_id), key)
            .await
            .expect("get")
            .expect("record");
        assert!(stored.is_fully_signed());
        assert_eq!(stored.last_notification.expect("stored").status, NotificationStatus::Failed);

        transport.fail.store(false, Ordering::SeqCst);
        let consultant_resend = service.resend_completion_notification(&Actor::Consultant(f.consultant_id), key).await;
        assert!(matches!(consultant_resend, Err(CraError::Forbidden(_))));

        let resent = service
            .resend_completion_notification(&Actor::Manager(f.manager_id), key)
            .await
            .expect("resend");
        assert_eq!(resent.notification.status, NotificationStatus::Sent);
        assert_eq!(resent.record.last_notification.expect("stored").status, NotificationStatus::Sent);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_foreign_client_is_forbidden_without_mutation() {
        let f = fixture().await;
        let service = service(&f, Arc::new(RecordingTransport::default()), SigningPolicy::default());
        service
            .submit_signature(submit(Actor::Consultant(f.consultant_id), f.consultant_id, 1, "c"))
            .await
            .expect("consultant signs");
        let key = SignatureKey::new(f.consultant_id, 1, 2026);
        let before = f.db.signature_repository().get_record(&key).await.expect("get");

        let result = service
            .submit_signature(submit(Actor::Client(f.client_id + 100), f.consultant_id, 1, "k"))
            .await;
        assert!(matches!(result, Err(CraError::Forbidden(_))));

        let after = f.db.signature_repository().get_record(&key).await.expect("get");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_slots_never_regress() {
        let f = fixture().await;
        let transport = Arc::new(RecordingTransport::default());
        let service = service(&f, transport.clone(), SigningPolicy::default());
        let sequence = [
            Actor::Client(f.client_id),
            Actor::Client(f.client_id),
            Actor::Consultant(f.consultant_id),
            Actor::Client(f.client_id),
            Actor::Manager(f.manager_id),
            Actor::Consultant(f.consultant_id),
            Actor::Manager(f.manager_id),
        ];

        let mut filled: Vec<SignerRole> = Vec::new();
        for (i, actor) in sequence.iter().enumerate() {
            let result = service
                .submit_signature(submit(*actor, f.consultant_id, 1, &i.to_string()))
                .await
                .expect("sign");
            if !filled.contains(&actor.role()) {
                filled.push(actor.role());
            }
            for role in &filled {
                assert!(result.record.slot(*role).is_some(), "{} regressed after step {}", role, i);
            }
        }

        // corrections after completion do not notify again
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        let record = service
            .get_signature_record(&Actor::Manager(f.manager_id), SignatureKey::new(f.consultant_id, 1, 2026))
            .await
            .expect("get")
            .expect("record");
        assert!(record.client_signature.expect("client").data.ends_with(&test_png("3")));
    }

    #[tokio::test]
    async fn test_validation_and_schedule_precondition() {
        let f = fixture().await;
        let strict = service(&f, Arc::new(RecordingTransport::default()), SigningPolicy::default());
        let consultant = Actor::Consultant(f.consultant_id);

        let bad_month = strict.submit_signature(submit(consultant, f.consultant_id, 13, "c")).await;
        assert!(matches!(bad_month, Err(CraError::Validation(_))));

        let mut empty_image = submit(consultant, f.consultant_id, 1, "c");
        empty_image.signature_image = String::new();
        assert!(matches!(strict.submit_signature(empty_image).await, Err(CraError::Validation(_))));

        let mut bad_year = submit(consultant, f.consultant_id, 1, "c");
        bad_year.year = 1999;
        assert!(matches!(strict.submit_signature(bad_year).await, Err(CraError::Validation(_))));

        let unknown = strict.submit_signature(submit(Actor::Consultant(999), 999, 1, "c")).await;
        assert!(matches!(unknown, Err(CraError::NotFound(_))));

        let no_rows = strict.submit_signature(submit(consultant, f.consultant_id, 2, "c")).await;
        assert!(matches!(no_rows, Err(CraError::NotFound(_))));
        assert!(f
            .db
            .signature_repository()
            .get_record(&SignatureKey::new(f.consultant_id, 2, 2026))
            .await
            .expect("get")
            .is_none());

        let lenient = service(
            &f,
            Arc::new(RecordingTransport::default()),
            SigningPolicy { require_schedule_data: false, ..SigningPolicy::default() },
        );
        let result = lenient
            .submit_signature(submit(consultant, f.consultant_id, 2, "c"))
            .await
            .expect("signing without rows allowed");
        assert!(result.record.work_schedule_id.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_completion_notifies_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("cra.db").display());
        let db = DbConnection::new(&url, 4).await.expect("Failed to open database");
        let f = fixture_on(db).await;
        let transport = Arc::new(RecordingTransport::default());
        let service = service(&f, transport.clone(), SigningPolicy { require_schedule_data: false, ..SigningPolicy::default() });

        for month in 1..=6u32 {
            for actor in [Actor::Consultant(f.consultant_id), Actor::Client(f.client_id)] {
                service.submit_signature(submit(actor, f.consultant_id, month, "x")).await.expect("sign");
            }

            let mut handles = Vec::new();
            for i in 0..4 {
                let service = service.clone();
                let command = submit(Actor::Manager(f.manager_id), f.consultant_id, month, &i.to_string());
                handles.push(tokio::spawn(async move { service.submit_signature(command).await }));
            }

            let mut notified = 0;
            for handle in handles {
                let result = handle.await.expect("join").expect("sign");
                assert!(result.record.is_fully_signed());
                if result.notification.is_some() {
                    notified += 1;
                }
            }
            assert_eq!(notified, 1, "month {} notified {} times", month, notified);
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 6);
    }
}
