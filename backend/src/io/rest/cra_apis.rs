//! # REST API for CRA signing
//!
//! Monthly CRA views, signature submission, the signed document download and
//! the administrative re-send of a completed CRA.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{CraOverviewResponse, NotificationStatus, SubmitSignatureRequest};
use tracing::info;

use crate::domain::commands::signature::SubmitSignatureCommand;
use crate::domain::models::signature::SignatureKey;
use crate::io::rest::mappers::SignatureMapper;
use crate::io::rest::{error_response, CallerActor};
use crate::AppState;

/// Create a router for CRA related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/consultants/:id/cra", get(get_cra_overview))
        .route("/cra/signatures", post(submit_signature))
        .route("/cra/:consultant_id/:year/:month", get(get_cra_month))
        .route("/cra/:consultant_id/:year/:month/document", get(get_cra_document))
        .route("/cra/:consultant_id/:year/:month/resend", post(resend_notification))
}

/// Every month of a consultant with figures and signature status
pub async fn get_cra_overview(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Path(consultant_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/consultants/{}/cra by {}", consultant_id, actor);

    match state.work_schedules.cra_overview(&actor, consultant_id).await {
        Ok(months) => {
            let response = CraOverviewResponse {
                consultant_id,
                months: months.into_iter().map(SignatureMapper::to_cra_month_response).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn get_cra_month(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Path((consultant_id, year, month)): Path<(i64, i32, u32)>,
) -> impl IntoResponse {
    info!("GET /api/cra/{}/{}/{} by {}", consultant_id, year, month, actor);

    let key = SignatureKey::new(consultant_id, month, year);
    match state.work_schedules.cra_month(&actor, key).await {
        Ok(cra) => (StatusCode::OK, Json(SignatureMapper::to_cra_month_response(cra))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Sign the caller's slot of a consultant-month
pub async fn submit_signature(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Json(request): Json<SubmitSignatureRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/cra/signatures by {} for consultant {} {:04}-{:02}",
        actor, request.consultant_id, request.year, request.month
    );

    let command = SubmitSignatureCommand {
        actor,
        consultant_id: request.consultant_id,
        month: request.month,
        year: request.year,
        signature_image: request.signature_image,
    };

    match state.signature_workflow.submit_signature(command).await {
        Ok(result) => (StatusCode::OK, Json(SignatureMapper::to_submit_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Signed CRA, or a draft report while signatures are missing
pub async fn get_cra_document(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Path((consultant_id, year, month)): Path<(i64, i32, u32)>,
) -> impl IntoResponse {
    info!("GET /api/cra/{}/{}/{}/document by {}", consultant_id, year, month, actor);

    let key = SignatureKey::new(consultant_id, month, year);
    match state.signature_workflow.cra_document(&actor, key).await {
        Ok(document) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, document.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", document.file_name),
                ),
            ],
            document.bytes,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Re-run delivery of a fully signed CRA without touching its signatures
pub async fn resend_notification(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Path((consultant_id, year, month)): Path<(i64, i32, u32)>,
) -> impl IntoResponse {
    info!("POST /api/cra/{}/{}/{}/resend by {}", consultant_id, year, month, actor);

    let key = SignatureKey::new(consultant_id, month, year);
    match state.signature_workflow.resend_completion_notification(&actor, key).await {
        Ok(result) => {
            let status = match result.notification.status {
                NotificationStatus::Sent => StatusCode::OK,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, Json(SignatureMapper::to_resend_response(result))).into_response()
        }
        Err(e) => error_response(e),
    }
}
