use shared::{SaveReusableSignatureRequest, StoredSignature};

use crate::domain::commands::reusable_signature::SaveSignatureCommand;
use crate::domain::models::signature::Actor;
use crate::domain::models::stored_signature::{DomainStoredSignature, SignatureContext};

pub struct StoredSignatureMapper;

impl StoredSignatureMapper {
    pub fn to_dto(domain: DomainStoredSignature) -> StoredSignature {
        StoredSignature {
            id: domain.id,
            user_type: domain.user_type,
            user_id: domain.user_id,
            user_name: domain.user_name,
            user_email: domain.user_email,
            signature_data: domain.signature_data,
            signed_at: domain.signed_at,
            document_type: domain.document_type,
            document_id: domain.document_id,
            consultant_id: domain.consultant_id,
            month: domain.month,
            year: domain.year,
        }
    }

    pub fn to_save_command(actor: Actor, request: SaveReusableSignatureRequest) -> SaveSignatureCommand {
        SaveSignatureCommand {
            actor,
            signature_image: request.signature_image,
            context: SignatureContext {
                document_type: request.document_type,
                document_id: request.document_id,
                consultant_id: request.consultant_id,
                month: request.month,
                year: request.year,
            },
        }
    }
}
