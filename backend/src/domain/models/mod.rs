pub mod party;
pub mod signature;
pub mod stored_signature;
pub mod work_schedule;
