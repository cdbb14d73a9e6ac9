// Repository modules
pub mod party_repository;
pub mod signature_repository;
pub mod stored_signature_repository;
pub mod work_schedule_repository;

// Re-export repository types
pub use party_repository::PartyRepository;
pub use signature_repository::SignatureRepository;
pub use stored_signature_repository::StoredSignatureRepository;
pub use work_schedule_repository::WorkScheduleRepository;
