pub mod party_mapper;
pub mod signature_mapper;
pub mod stored_signature_mapper;
pub mod work_schedule_mapper;

pub use party_mapper::PartyMapper;
pub use signature_mapper::SignatureMapper;
pub use stored_signature_mapper::StoredSignatureMapper;
pub use work_schedule_mapper::WorkScheduleMapper;
