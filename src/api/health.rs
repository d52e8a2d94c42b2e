use crate::adapters::database::ConnectionState;
use crate::api::schemas::health::{DiagnosticResponse, HealthResponse};
use crate::api::{AppState, format_timestamp};
use axum::{Json, extract::State, http::Method};
use time::OffsetDateTime;

/// Always `200`; the body carries the observed database state.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.health_service.report();

    Json(HealthResponse {
        status: "OK".to_string(),
        database: report.database.map_or("unknown", ConnectionState::as_str).to_string(),
        timestamp: format_timestamp(report.timestamp),
        environment: report.environment,
    })
}

/// Echo endpoint for checking that requests reach the API at all.
pub async fn diagnostics(method: Method) -> Json<DiagnosticResponse> {
    Json(DiagnosticResponse {
        success: true,
        message: "API is working!".to_string(),
        method: method.to_string(),
        timestamp: format_timestamp(OffsetDateTime::now_utc()),
    })
}
