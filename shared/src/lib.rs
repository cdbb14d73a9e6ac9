//! Wire types shared between the CRA signing backend and its clients.
//!
//! Everything here is a plain serde DTO. The backend keeps its own domain
//! models and maps to and from these at the REST boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three parties that sign a CRA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerRole {
    Consultant,
    Client,
    Manager,
}

impl SignerRole {
    pub const ALL: [SignerRole; 3] = [SignerRole::Consultant, SignerRole::Client, SignerRole::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignerRole::Consultant => "consultant",
            SignerRole::Client => "client",
            SignerRole::Manager => "manager",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "consultant" => Some(SignerRole::Consultant),
            "client" => Some(SignerRole::Client),
            "manager" => Some(SignerRole::Manager),
            _ => None,
        }
    }
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-day slot of a schedule entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Evening,
}

/// Reference to a work type or leave type, with its display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRef {
    pub id: i64,
    pub name: String,
}

/// A single half-day (or legacy full-day) timesheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkScheduleEntry {
    pub id: i64,
    pub consultant_id: i64,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Absent on rows written before half-day tracking existed
    pub period: Option<Period>,
    pub work_type: Option<LabelRef>,
    pub leave_type: Option<LabelRef>,
    /// Legacy free-form work classification
    #[serde(rename = "type")]
    pub legacy_type: Option<String>,
    /// Legacy free-form absence classification
    pub absence_type: Option<String>,
    pub days_worked: f64,
    pub weekend_worked: f64,
    pub absence_days: f64,
    pub work_type_days: f64,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Query for listing schedule entries; both fields must be given to filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkScheduleListRequest {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkScheduleListResponse {
    pub entries: Vec<WorkScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertWorkScheduleRequest {
    pub consultant_id: i64,
    pub date: String,
    pub period: Option<Period>,
    pub work_type: Option<LabelRef>,
    pub leave_type: Option<LabelRef>,
    #[serde(rename = "type", default)]
    pub legacy_type: Option<String>,
    #[serde(default)]
    pub absence_type: Option<String>,
    #[serde(default)]
    pub days_worked: f64,
    #[serde(default)]
    pub weekend_worked: f64,
    #[serde(default)]
    pub absence_days: f64,
    #[serde(default)]
    pub work_type_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertWorkScheduleResponse {
    pub entry: WorkScheduleEntry,
    pub success_message: String,
}

/// Aggregated activity of one consultant for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub consultant_id: i64,
    pub month: u32,
    pub year: i32,
    /// Locale-formatted month name, e.g. "janvier 2026"
    pub month_label: String,
    pub days_worked: f64,
    pub weekend_worked: f64,
    pub absence_days: f64,
    pub work_type_days: f64,
    /// Distinct absence labels, comma-joined
    pub absence_types: String,
    /// Distinct work labels, comma-joined
    pub work_types: String,
}

/// Fill state of one signature slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotStatus {
    pub role: SignerRole,
    pub signed: bool,
    pub signed_at: Option<String>,
    pub signer_id: Option<i64>,
}

/// Outcome of the completion notification for a CRA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// This request did not complete the CRA
    NotTriggered,
    Sent,
    /// All parties signed but delivery failed; an admin can resend
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationReport {
    pub status: NotificationStatus,
    pub recipients: Vec<String>,
    pub detail: Option<String>,
}

/// Signature state of one CRA, without the image payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureStatus {
    pub consultant_id: i64,
    pub month: u32,
    pub year: i32,
    pub slots: Vec<SlotStatus>,
    pub fully_signed: bool,
    pub completed_at: Option<String>,
    /// Last recorded delivery attempt, if any
    pub last_notification: Option<NotificationReport>,
    pub last_notified_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitSignatureRequest {
    pub consultant_id: i64,
    pub month: u32,
    pub year: i32,
    /// PNG (or JPEG/SVG) image, raw base64 or a `data:` URL
    pub signature_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitSignatureResponse {
    pub signature: SignatureStatus,
    pub fully_signed: bool,
    pub notification: NotificationReport,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResendNotificationResponse {
    pub signature: SignatureStatus,
    pub notification: NotificationReport,
    pub message: String,
}

/// One month of a consultant's CRA: figures plus signature state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraMonthResponse {
    pub summary: MonthlySummary,
    pub signature: SignatureStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraOverviewResponse {
    pub consultant_id: i64,
    pub months: Vec<CraMonthResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReusableSignatureRequest {
    pub signature_image: String,
    pub document_type: Option<String>,
    pub document_id: Option<i64>,
    pub consultant_id: Option<i64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// A previously saved signature that its owner can re-import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSignature {
    pub id: String,
    pub user_type: SignerRole,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub signature_data: String,
    pub signed_at: String,
    pub document_type: Option<String>,
    pub document_id: Option<i64>,
    pub consultant_id: Option<i64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReusableSignatureResponse {
    pub signature: StoredSignature,
    pub success_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetReusableSignatureRequest {
    pub document_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetReusableSignatureResponse {
    pub signature: Option<StoredSignature>,
}

/// Client company or manager; both only need a name and a mailbox here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultant {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub client_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateConsultantRequest {
    pub name: String,
    pub email: String,
    pub client_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
