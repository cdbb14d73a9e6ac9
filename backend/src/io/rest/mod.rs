//! # REST API Interface Layer
//!
//! HTTP endpoints of the CRA signing service, all nested under `/api`.
//!
//! ## Caller identity
//!
//! Authentication happens upstream. The authenticated identity reaches this
//! service as two headers, `x-actor-role` (`consultant`, `client` or
//! `manager`) and `x-actor-id`; a request without a usable pair is rejected
//! with 401 before any handler runs.
//!
//! ## Error mapping
//!
//! | Domain error | Status |
//! |---|---|
//! | `Validation` | 400 |
//! | `Forbidden` | 403 |
//! | `NotFound` | 404 |
//! | `Storage` | 500 |
//!
//! Error bodies are `{"error": "<message>"}`.

pub mod cra_apis;
pub mod mappers;
pub mod party_apis;
pub mod reusable_signature_apis;
pub mod work_schedule_apis;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    Router,
};
use shared::{ErrorResponse, SignerRole};
use tracing::{error, warn};

use crate::domain::errors::CraError;
use crate::domain::models::signature::Actor;
use crate::AppState;

pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// All API routes, to be nested under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(work_schedule_apis::router())
        .merge(cra_apis::router())
        .merge(party_apis::router())
        .nest("/signatures/reusable", reusable_signature_apis::router())
}

/// Caller identity taken from the upstream auth headers
#[derive(Debug, Clone, Copy)]
pub struct CallerActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for CallerActor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let role = header(ACTOR_ROLE_HEADER)
            .as_deref()
            .and_then(SignerRole::parse)
            .ok_or_else(|| unauthorized("Missing or invalid x-actor-role header"))?;
        let id = header(ACTOR_ID_HEADER)
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or_else(|| unauthorized("Missing or invalid x-actor-id header"))?;

        Ok(CallerActor(Actor::new(role, id)))
    }
}

fn unauthorized(message: &str) -> Response {
    warn!("Rejected request: {}", message);
    error_body(StatusCode::UNAUTHORIZED, message.to_string())
}

pub fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

/// Convert a domain error into its HTTP response
pub fn error_response(e: CraError) -> Response {
    let status = match &e {
        CraError::Validation(_) => StatusCode::BAD_REQUEST,
        CraError::Forbidden(_) => StatusCode::FORBIDDEN,
        CraError::NotFound(_) => StatusCode::NOT_FOUND,
        CraError::Storage(inner) => {
            error!("Storage failure: {:#}", inner);
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error".to_string());
        }
    };
    warn!("Request failed with {}: {}", status, e);
    error_body(status, e.to_string())
}
