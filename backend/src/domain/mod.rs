//! # Domain Module
//!
//! Business logic of the CRA signing service, independent of HTTP and of the
//! storage engine.
//!
//! ## Module Organization
//!
//! - **monthly_aggregator**: pure fold of timesheet rows into monthly figures
//! - **signature_workflow**: three-party signing state machine per consultant-month
//! - **completion_notifier**: renders and emails a CRA once all parties signed
//! - **reusable_signature_service**: per-user history of saved signatures
//! - **work_schedule_service**: timesheet rows and the CRA views built on them
//! - **party_service**: minimal consultant/client/manager directory
//! - **authorization**: who may act on a consultant's CRA
//!
//! ## Business Rules
//!
//! - A slot, once filled, is never emptied; re-signing replaces it
//! - The notifier fires exactly once per consultant-month, from the write
//!   that completes the record
//! - Delivery failures never undo signatures; an administrator can resend
//! - Legacy rows with unusable dates are skipped by the aggregation

pub mod authorization;
pub mod commands;
pub mod completion_notifier;
pub mod document_renderer;
pub mod email_service;
pub mod errors;
pub mod models;
pub mod monthly_aggregator;
pub mod party_service;
pub mod reusable_signature_service;
pub mod signature_image;
pub mod signature_workflow;
pub mod work_schedule_service;

pub use authorization::{DirectoryAuthority, SigningAuthority};
pub use completion_notifier::{CompletionNotifier, NotifierOptions};
pub use document_renderer::{DocumentRenderer, HtmlDocumentRenderer, RenderedDocument};
pub use email_service::{EmailConfig, EmailTransport};
pub use errors::{CraError, NotificationError};
pub use party_service::PartyService;
pub use reusable_signature_service::ReusableSignatureService;
pub use signature_workflow::{SignatureWorkflowService, SigningPolicy};
pub use work_schedule_service::WorkScheduleService;
