use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::error;

use crate::api::{state::AppState, types::*};
use crate::domain::{FleetStatistics, HealthStatus};
use crate::error::BranchwatchError;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn registry_unavailable(e: BranchwatchError) -> ApiError {
    error!("Health probe could not list branches: {}", e);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// GET /api/health/branches
pub async fn get_branch_statuses(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<HealthStatus>>, ApiError> {
    state
        .probe
        .probe_registry()
        .await
        .map(Json)
        .map_err(registry_unavailable)
}

/// GET /api/health/branches/:id
pub async fn get_branch_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<HealthStatus>, ApiError> {
    match state.probe.probe_one(&id).await {
        Ok(Some(status)) => Ok(Json(status)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("branch {} not found", id),
            }),
        )),
        Err(e) => Err(registry_unavailable(e)),
    }
}

/// GET /api/health/stats
pub async fn get_fleet_statistics(
    State(state): State<AppState>,
) -> std::result::Result<Json<FleetStatistics>, ApiError> {
    state
        .probe
        .fleet_statistics()
        .await
        .map(Json)
        .map_err(registry_unavailable)
}

/// GET /healthz -- process liveness
pub async fn liveness_handler(State(state): State<AppState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_seconds(),
    })
}

/// GET /metrics -- Prometheus text format
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        state.metrics.prometheus(),
    )
}
