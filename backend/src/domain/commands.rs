//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the public DTOs defined in
//! the `shared` crate to these internal types.

pub mod signature {
    use crate::domain::models::signature::{Actor, LastNotification, SignatureRecord};

    /// Input for signing one slot of a consultant-month CRA.
    #[derive(Debug, Clone)]
    pub struct SubmitSignatureCommand {
        pub actor: Actor,
        pub consultant_id: i64,
        pub month: u32,
        pub year: i32,
        pub signature_image: String,
    }

    /// Result of a signature submission.
    #[derive(Debug, Clone)]
    pub struct SubmitSignatureResult {
        pub record: SignatureRecord,
        /// Present only when this submission completed the CRA
        pub notification: Option<LastNotification>,
    }

    /// Result of an administrator resend.
    #[derive(Debug, Clone)]
    pub struct ResendNotificationResult {
        pub record: SignatureRecord,
        pub notification: LastNotification,
    }
}

pub mod reusable_signature {
    use crate::domain::models::signature::Actor;
    use crate::domain::models::stored_signature::SignatureContext;

    /// Input for saving a signature to the caller's history.
    #[derive(Debug, Clone)]
    pub struct SaveSignatureCommand {
        pub actor: Actor,
        pub signature_image: String,
        pub context: SignatureContext,
    }
}

pub mod work_schedule {
    use chrono::NaiveDate;
    use shared::{LabelRef, Period};

    use crate::domain::models::signature::SignatureRecord;
    use crate::domain::monthly_aggregator::DomainMonthlySummary;

    /// Query for listing a consultant's schedule rows.
    #[derive(Debug, Clone, Default)]
    pub struct WorkScheduleListQuery {
        pub month: Option<u32>,
        pub year: Option<i32>,
    }

    /// Input for creating or replacing a schedule row.
    #[derive(Debug, Clone)]
    pub struct UpsertWorkScheduleCommand {
        pub consultant_id: i64,
        pub date: String,
        pub period: Option<Period>,
        pub work_type: Option<LabelRef>,
        pub leave_type: Option<LabelRef>,
        pub legacy_type: Option<String>,
        pub legacy_absence_type: Option<String>,
        pub days_worked: f64,
        pub weekend_worked: f64,
        pub absence_days: f64,
        pub work_type_days: f64,
    }

    impl UpsertWorkScheduleCommand {
        pub fn parsed_date(&self) -> Option<NaiveDate> {
            NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
        }
    }

    /// One CRA month: figures plus signature state.
    #[derive(Debug, Clone)]
    pub struct CraMonth {
        pub summary: DomainMonthlySummary,
        pub month_label: String,
        pub record: Option<SignatureRecord>,
    }
}

pub mod party {
    /// Input for registering a consultant.
    #[derive(Debug, Clone)]
    pub struct CreateConsultantCommand {
        pub name: String,
        pub email: String,
        pub client_id: Option<i64>,
        pub manager_id: Option<i64>,
        pub project_name: Option<String>,
    }
}
