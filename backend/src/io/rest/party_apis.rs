//! # REST API for Parties
//!
//! Minimal create/get/list of clients, managers and consultants, enough to
//! decide who may sign a CRA and where the signed document goes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use shared::{CreateConsultantRequest, CreateContactRequest};
use tracing::info;

use crate::domain::models::party::ContactKind;
use crate::io::rest::error_response;
use crate::io::rest::mappers::PartyMapper;
use crate::AppState;

/// Create a router for party APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/:id", get(get_client))
        .route("/managers", get(list_managers).post(create_manager))
        .route("/managers/:id", get(get_manager))
        .route("/consultants", get(list_consultants).post(create_consultant))
        .route("/consultants/:id", get(get_consultant))
}

async fn create_contact(state: AppState, kind: ContactKind, request: CreateContactRequest) -> axum::response::Response {
    info!("POST /api/{} - request: {:?}", kind.table(), request);
    match state.parties.create_contact(kind, &request.name, &request.email).await {
        Ok(contact) => (StatusCode::CREATED, Json(PartyMapper::contact_to_dto(contact))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_contact(state: AppState, kind: ContactKind, id: i64) -> axum::response::Response {
    info!("GET /api/{}/{}", kind.table(), id);
    match state.parties.get_contact(kind, id).await {
        Ok(contact) => (StatusCode::OK, Json(PartyMapper::contact_to_dto(contact))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_contacts(state: AppState, kind: ContactKind) -> axum::response::Response {
    info!("GET /api/{}", kind.table());
    match state.parties.list_contacts(kind).await {
        Ok(contacts) => {
            let response: Vec<_> = contacts.into_iter().map(PartyMapper::contact_to_dto).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn create_client(State(state): State<AppState>, Json(request): Json<CreateContactRequest>) -> impl IntoResponse {
    create_contact(state, ContactKind::Client, request).await
}

pub async fn get_client(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    get_contact(state, ContactKind::Client, id).await
}

pub async fn list_clients(State(state): State<AppState>) -> impl IntoResponse {
    list_contacts(state, ContactKind::Client).await
}

pub async fn create_manager(State(state): State<AppState>, Json(request): Json<CreateContactRequest>) -> impl IntoResponse {
    create_contact(state, ContactKind::Manager, request).await
}

pub async fn get_manager(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    get_contact(state, ContactKind::Manager, id).await
}

pub async fn list_managers(State(state): State<AppState>) -> impl IntoResponse {
    list_contacts(state, ContactKind::Manager).await
}

pub async fn create_consultant(
    State(state): State<AppState>,
    Json(request): Json<CreateConsultantRequest>,
) -> impl IntoResponse {
    info!("POST /api/consultants - request: {:?}", request);

    let command = PartyMapper::to_create_consultant_command(request);
    match state.parties.create_consultant(command).await {
        Ok(consultant) => (StatusCode::CREATED, Json(PartyMapper::consultant_to_dto(consultant))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_consultant(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("GET /api/consultants/{}", id);
    match state.parties.get_consultant(id).await {
        Ok(consultant) => (StatusCode::OK, Json(PartyMapper::consultant_to_dto(consultant))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_consultants(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/consultants");
    match state.parties.list_consultants().await {
        Ok(consultants) => {
            let response: Vec<_> = consultants.into_iter().map(PartyMapper::consultant_to_dto).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}
