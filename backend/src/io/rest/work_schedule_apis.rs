//! # REST API for Work Schedules
//!
//! Timesheet rows the monthly CRA figures are computed from.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use shared::{UpsertWorkScheduleRequest, UpsertWorkScheduleResponse, WorkScheduleListRequest, WorkScheduleListResponse};
use tracing::info;

use crate::domain::commands::work_schedule::WorkScheduleListQuery;
use crate::io::rest::mappers::WorkScheduleMapper;
use crate::io::rest::{error_response, CallerActor};
use crate::AppState;

/// Create a router for work schedule related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/consultants/:id/work-schedules", get(list_work_schedules))
        .route("/work-schedules", put(upsert_work_schedule))
}

/// List a consultant's rows, optionally for one month
pub async fn list_work_schedules(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Path(consultant_id): Path<i64>,
    Query(request): Query<WorkScheduleListRequest>,
) -> impl IntoResponse {
    info!("GET /api/consultants/{}/work-schedules by {} - {:?}", consultant_id, actor, request);

    let query = WorkScheduleListQuery {
        month: request.month,
        year: request.year,
    };
    match state.work_schedules.list_entries(&actor, consultant_id, query).await {
        Ok(entries) => {
            let response = WorkScheduleListResponse {
                entries: WorkScheduleMapper::to_dto_list(entries),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Create or replace the row of one consultant, date and half-day
pub async fn upsert_work_schedule(
    State(state): State<AppState>,
    CallerActor(actor): CallerActor,
    Json(request): Json<UpsertWorkScheduleRequest>,
) -> impl IntoResponse {
    info!("PUT /api/work-schedules by {} - request: {:?}", actor, request);

    let command = WorkScheduleMapper::to_upsert_command(request);
    match state.work_schedules.upsert_entry(&actor, command).await {
        Ok(entry) => {
            let response = UpsertWorkScheduleResponse {
                success_message: format!("Schedule saved for {}", entry.date),
                entry: WorkScheduleMapper::to_dto(entry),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::completion_notifier::tests::RecordingTransport;
    use crate::domain::models::signature::Actor;
    use crate::io::rest::tests::{parse, send, test_app};
    use axum::http::Method;
    use serde_json::json;
    use shared::{Consultant, Contact, Period};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_upsert_and_list_by_month() {
        let app = test_app(Arc::new(RecordingTransport::default())).await;
        let (_, body) = send(&app, Method::POST, "/api/clients", None, Some(&json!({"name": "Acme", "email": "acme@client.test"}))).await;
        let client: Contact = parse(&body);
        let (_, body) = send(
            &app,
            Method::POST,
            "/api/consultants",
            None,
            Some(&json!({"name": "Alice", "email": "alice@firm.test", "client_id": client.id})),
        )
        .await;
        let consultant: Consultant = parse(&body);
        let me = Some(Actor::Consultant(consultant.id));

        for (date, period) in [("2026-01-05", "evening"), ("2026-01-05", "morning"), ("2026-02-02", "morning")] {
            let (status, body) = send(
                &app,
                Method::PUT,
                "/api/work-schedules",
                me,
                Some(&json!({
                    "consultant_id": consultant.id,
                    "date": date,
                    "period": period,
                    "type": "regie",
                    "days_worked": 0.5
                })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let saved: UpsertWorkScheduleResponse = parse(&body);
            assert_eq!(saved.entry.legacy_type.as_deref(), Some("regie"));
        }

        let uri = format!("/api/consultants/{}/work-schedules?month=1&year=2026", consultant.id);
        let (status, body) = send(&app, Method::GET, &uri, Some(Actor::Client(client.id)), None::<&()>).await;
        assert_eq!(status, StatusCode::OK);
        let january: WorkScheduleListResponse = parse(&body);
        let periods: Vec<Option<Period>> = january.entries.iter().map(|e| e.period).collect();
        assert_eq!(periods, vec![Some(Period::Morning), Some(Period::Evening)]);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/work-schedules",
            Some(Actor::Client(client.id)),
            Some(&json!({"consultant_id": consultant.id, "date": "2026-01-06", "days_worked": 1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/work-schedules",
            me,
            Some(&json!({"consultant_id": consultant.id, "date": "06/01/2026", "days_worked": 1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
