//! # REST API for Reusable Signatures
//!
//! Lets a user save a drawn signature and import the latest one into a new
//! signing session. Everything is scoped to the calling actor.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{
    GetReusableSignatureRequest, GetReusableSignatureResponse, SaveReusableSignatureRequest,
    SaveReusableSignatureResponse,
};
use tracing::info;

use crate::io::rest::mappers::StoredSignatureMapper;
use crate::io::rest::{error_response, CallerActor};
use crate::AppState;

/// Create a router for reusable signature APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(save_signature).get(get_latest_signature))
        .route("/history", get(list_signature_history))
}

pub async fn save_signature(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Json(request): Json<SaveReusableSignatureRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/signatures/reusable by {} - document_type: {:?}",
        actor, request.document_type
    );

    let command = StoredSignatureMapper::to_save_command(actor, request);
    match state.reusable_signatures.save_signature(command).await {
        Ok(signature) => {
            let response = SaveReusableSignatureResponse {
                signature: StoredSignatureMapper::to_dto(signature),
                success_message: "Signature saved".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Latest saved signature of the caller; `signature` is null when none exists
pub async fn get_latest_signature(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Query(request): Query<GetReusableSignatureRequest>,
) -> impl IntoResponse {
    info!("GET /api/signatures/reusable by {} - {:?}", actor, request);

    match state
        .reusable_signatures
        .get_latest_signature(&actor, request.document_type.as_deref())
        .await
    {
        Ok(signature) => {
            let response = GetReusableSignatureResponse {
                signature: signature.map(StoredSignatureMapper::to_dto),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn list_signature_history(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
) -> impl IntoResponse {
    info!("GET /api/signatures/reusable/history by {}", actor);

    match state.reusable_signatures.list_history(&actor).await {
        Ok(signatures) => {
            let response: Vec<_> = signatures.into_iter().map(StoredSignatureMapper::to_dto).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}
