use axum::{
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Financial dashboard
        .route(
            "/api/dashboard/financial",
            get(handlers::get_financial_report).post(handlers::post_financial_report),
        )
        // Fleet health
        .route("/api/health/branches", get(handlers::get_branch_statuses))
        .route("/api/health/branches/:id", get(handlers::get_branch_status))
        .route("/api/health/stats", get(handlers::get_fleet_statistics))
        // Service endpoints
        .route("/healthz", get(handlers::liveness_handler))
        .route("/metrics", get(handlers::metrics_handler))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
