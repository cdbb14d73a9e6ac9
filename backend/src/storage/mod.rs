//! # Storage Module
//!
//! Persistence for the CRA signing service. Everything lives in one SQLite
//! database accessed through SQLx:
//!
//! - **work_schedules**: daily timesheet rows, unique per (consultant, date, period)
//! - **signature_records**: one row per (consultant, month, year) with three slots
//! - **stored_signatures**: append-only reusable signature history
//! - **clients / managers / consultants**: the minimal party directory
//!
//! Domain services only see the traits in [`traits`]; the repositories here
//! are the production implementations.

pub mod connection;
pub mod repositories;
pub mod traits;

pub use connection::DbConnection;
pub use repositories::{PartyRepository, SignatureRepository, StoredSignatureRepository, WorkScheduleRepository};
pub use traits::{PartyStorage, SignatureStorage, StoredSignatureStorage, WorkScheduleStorage};
