use shared::{Consultant, Contact, CreateConsultantRequest};

use crate::domain::commands::party::CreateConsultantCommand;
use crate::domain::models::party::{DomainConsultant, DomainContact};

pub struct PartyMapper;

impl PartyMapper {
    pub fn contact_to_dto(domain: DomainContact) -> Contact {
        Contact {
            id: domain.id,
            name: domain.name,
            email: domain.email,
        }
    }

    pub fn consultant_to_dto(domain: DomainConsultant) -> Consultant {
        Consultant {
            id: domain.id,
            name: domain.name,
            email: domain.email,
            client_id: domain.client_id,
            manager_id: domain.manager_id,
            project_name: domain.project_name,
        }
    }

    pub fn to_create_consultant_command(request: CreateConsultantRequest) -> CreateConsultantCommand {
        CreateConsultantCommand {
            name: request.name,
            email: request.email,
            client_id: request.client_id,
            manager_id: request.manager_id,
            project_name: request.project_name,
        }
    }
}
