use serde::{Deserialize, Serialize};
use shared::SignerRole;

/// A saved signature in a user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainStoredSignature {
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

impl DomainStoredSignature {
    pub fn generate_id() -> String {
        format!("signature::{}", uuid::Uuid::new_v4())
    }
}

/// Informational context attached to a saved signature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureContext {
    pub document_type: Option<String>,
    pub document_id: Option<i64>,
    pub consultant_id: Option<i64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}
