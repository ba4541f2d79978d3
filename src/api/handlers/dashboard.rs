use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};

use crate::api::{state::AppState, types::*};
use crate::domain::AggregateReport;

async fn build_report(
    state: &AppState,
    req: &DashboardRequest,
) -> std::result::Result<Json<AggregateReport>, (StatusCode, Json<ErrorResponse>)> {
    let range = req
        .range()
        .map_err(|error| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })))?;

    Ok(Json(state.orchestrator.aggregate(range, req.category).await))
}

/// POST /api/dashboard/financial
///
/// A request with no JSON body is answered like one with no dates; a body that
/// does not decode is answered with the decoder's message.
pub async fn post_financial_report(
    State(state): State<AppState>,
    req: std::result::Result<Json<DashboardRequest>, JsonRejection>,
) -> std::result::Result<Json<AggregateReport>, (StatusCode, Json<ErrorResponse>)> {
    let req = match req {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => DashboardRequest::default(),
        Err(rejection) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: rejection.body_text(),
                }),
            ))
        }
    };
    build_report(&state, &req).await
}

/// GET /api/dashboard/financial?start_date=&end_date=
pub async fn get_financial_report(
    State(state): State<AppState>,
    Query(req): Query<DashboardRequest>,
) -> std::result::Result<Json<AggregateReport>, (StatusCode, Json<ErrorResponse>)> {
    build_report(&state, &req).await
}
