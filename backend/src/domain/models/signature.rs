use serde::{Deserialize, Serialize};
use shared::{NotificationStatus, SignerRole};
use std::fmt;

/// Authenticated caller acting on a CRA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Actor {
    Consultant(i64),
    Client(i64),
    Manager(i64),
}

impl Actor {
    pub fn new(role: SignerRole, id: i64) -> Self {
        match role {
            SignerRole::Consultant => Actor::Consultant(id),
            SignerRole::Client => Actor::Client(id),
            SignerRole::Manager => Actor::Manager(id),
        }
    }

    pub fn role(&self) -> SignerRole {
        match self {
            Actor::Consultant(_) => SignerRole::Consultant,
            Actor::Client(_) => SignerRole::Client,
            Actor::Manager(_) => SignerRole::Manager,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Actor::Consultant(id) | Actor::Client(id) | Actor::Manager(id) => *id,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.role(), self.id())
    }
}

/// Identity of a CRA: one consultant, one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignatureKey {
    pub consultant_id: i64,
    pub month: u32,
    pub year: i32,
}

impl SignatureKey {
    pub fn new(consultant_id: i64, month: u32, year: i32) -> Self {
        Self { consultant_id, month, year }
    }

    /// `YYYY-MM`, matching the prefix of ISO dates in that month
    pub fn date_prefix(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consultant {} {:04}-{:02}", self.consultant_id, self.year, self.month)
    }
}

/// A filled signature position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSlot {
    /// Normalized `data:` URL of the signature image
    pub data: String,
    pub signed_at: String,
    pub signer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastNotification {
    pub status: NotificationStatus,
    pub at: String,
    pub recipients: Vec<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub id: i64,
    pub key: SignatureKey,
    pub consultant_signature: Option<SignatureSlot>,
    pub client_signature: Option<SignatureSlot>,
    pub manager_signature: Option<SignatureSlot>,
    pub work_schedule_id: Option<i64>,
    pub client_id: Option<i64>,
    pub manager_id: Option<i64>,
    /// Set once, by the write that filled the last empty slot
    pub completed_at: Option<String>,
    pub last_notification: Option<LastNotification>,
    pub created_at: String,
    pub updated_at: String,
}

impl SignatureRecord {
    pub fn slot(&self, role: SignerRole) -> Option<&SignatureSlot> {
        match role {
            SignerRole::Consultant => self.consultant_signature.as_ref(),
            SignerRole::Client => self.client_signature.as_ref(),
            SignerRole::Manager => self.manager_signature.as_ref(),
        }
    }

    pub fn is_fully_signed(&self) -> bool {
        SignerRole::ALL.iter().all(|role| self.slot(*role).is_some())
    }

    /// A month is locked once anyone has signed it
    pub fn has_any_signature(&self) -> bool {
        SignerRole::ALL.iter().any(|role| self.slot(*role).is_some())
    }
}

/// One slot write plus the linkage columns known at signing time
#[derive(Debug, Clone, PartialEq)]
pub struct SlotWrite {
    pub role: SignerRole,
    pub slot: SignatureSlot,
    pub work_schedule_id: Option<i64>,
    pub client_id: Option<i64>,
    pub manager_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotWriteOutcome {
    pub record: SignatureRecord,
    /// True only for the write that moved the record to fully signed
    pub completed_now: bool,
}
