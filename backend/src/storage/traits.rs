//! # Storage Traits
//!
//! Storage abstractions the domain services depend on. The SQLite
//! repositories implement them in production; tests may swap in their own.

use anyhow::Result;
use async_trait::async_trait;
use shared::SignerRole;

use crate::domain::models::party::{ContactKind, DomainConsultant, DomainContact, NewConsultant};
use crate::domain::models::signature::{LastNotification, SignatureKey, SignatureRecord, SlotWrite, SlotWriteOutcome};
use crate::domain::models::stored_signature::DomainStoredSignature;
use crate::domain::models::work_schedule::{DomainWorkScheduleEntry, NewWorkScheduleEntry};

/// Daily timesheet rows, read-only from the signing workflow's perspective
#[async_trait]
pub trait WorkScheduleStorage: Send + Sync {
    /// Insert or replace the row for (consultant, date, period)
    async fn upsert_entry(&self, entry: &NewWorkScheduleEntry) -> Result<DomainWorkScheduleEntry>;

    /// All rows of a consultant ordered by date then period
    async fn list_entries(&self, consultant_id: i64) -> Result<Vec<DomainWorkScheduleEntry>>;

    /// Rows of one month, including legacy rows that only carry a date
    async fn list_entries_for_month(&self, key: &SignatureKey) -> Result<Vec<DomainWorkScheduleEntry>>;

    /// Id of the earliest row of the month, `None` when the month is empty
    async fn first_entry_id_for_month(&self, key: &SignatureKey) -> Result<Option<i64>>;
}

/// Per-month signature records with three monotonic slots
#[async_trait]
pub trait SignatureStorage: Send + Sync {
    async fn get_record(&self, key: &SignatureKey) -> Result<Option<SignatureRecord>>;

    async fn list_records(&self, consultant_id: i64) -> Result<Vec<SignatureRecord>>;

    /// Create the record if needed, fill one slot, and atomically claim the
    /// completion if this write made the record fully signed.
    ///
    /// For a given key, `completed_now` is true for exactly one call ever.
    async fn write_slot(&self, key: &SignatureKey, write: &SlotWrite) -> Result<SlotWriteOutcome>;

    /// Store the outcome of the latest delivery attempt
    async fn record_notification(&self, key: &SignatureKey, notification: &LastNotification) -> Result<()>;
}

/// Append-only history of signatures users chose to keep
#[async_trait]
pub trait StoredSignatureStorage: Send + Sync {
    async fn append_signature(&self, signature: &DomainStoredSignature) -> Result<()>;

    /// Most recent by `signed_at`, ties going to the later insert
    async fn latest_signature(
        &self,
        user_type: SignerRole,
        user_id: i64,
        document_type: Option<&str>,
    ) -> Result<Option<DomainStoredSignature>>;

    /// Full history, most recent first
    async fn list_signatures(&self, user_type: SignerRole, user_id: i64) -> Result<Vec<DomainStoredSignature>>;
}

/// Minimal directory of consultants, clients and managers
#[async_trait]
pub trait PartyStorage: Send + Sync {
    async fn create_contact(&self, kind: ContactKind, name: &str, email: &str) -> Result<DomainContact>;

    async fn get_contact(&self, kind: ContactKind, id: i64) -> Result<Option<DomainContact>>;

    async fn list_contacts(&self, kind: ContactKind) -> Result<Vec<DomainContact>>;

    async fn create_consultant(&self, consultant: &NewConsultant) -> Result<DomainConsultant>;

    async fn get_consultant(&self, id: i64) -> Result<Option<DomainConsultant>>;

    async fn list_consultants(&self) -> Result<Vec<DomainConsultant>>;
}
