//! # CRA Signing Backend
//!
//! Reconciles consultants' daily timesheets into monthly activity reports
//! (CRA) and drives their three-party signature.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (workflow, aggregation, notification)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::email_service::transport_from_config;
use crate::domain::{
    CompletionNotifier, DirectoryAuthority, EmailTransport, HtmlDocumentRenderer, PartyService,
    ReusableSignatureService, SignatureWorkflowService, SigningAuthority, WorkScheduleService,
};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub signature_workflow: SignatureWorkflowService,
    pub work_schedules: WorkScheduleService,
    pub reusable_signatures: ReusableSignatureService,
    pub parties: PartyService,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::new(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;

    info!("Setting up email transport");
    let transport = transport_from_config(&config.email)?;

    build_state(db, transport, config)
}

/// Wire the services on top of an open database and a transport
pub fn build_state(db: DbConnection, transport: Arc<dyn EmailTransport>, config: &AppConfig) -> Result<AppState> {
    info!("Setting up domain model");
    let parties = Arc::new(db.party_repository());
    let schedules = Arc::new(db.work_schedule_repository());
    let signatures = Arc::new(db.signature_repository());
    let authority: Arc<dyn SigningAuthority> = Arc::new(DirectoryAuthority::new(parties.clone()));
    let locale = config.locale()?;

    let notifier = CompletionNotifier::new(
        parties.clone(),
        schedules.clone(),
        signatures.clone(),
        Arc::new(HtmlDocumentRenderer::new()),
        transport,
        config.notifier_options()?,
    );

    let signature_workflow = SignatureWorkflowService::new(
        signatures.clone(),
        schedules.clone(),
        authority.clone(),
        notifier,
        config.signing_policy(),
    );
    let work_schedules = WorkScheduleService::new(schedules, signatures, authority, locale);
    let reusable_signatures = ReusableSignatureService::new(
        Arc::new(db.stored_signature_repository()),
        parties.clone(),
        config.signing.max_image_bytes,
    );

    Ok(AppState {
        signature_workflow,
        work_schedules,
        reusable_signatures,
        parties: PartyService::new(parties),
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &AppConfig) -> Result<Router> {
    let origin = config
        .server
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", config.server.cors_origin))?;

    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Ok(Router::new()
        .nest("/api", io::rest::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
