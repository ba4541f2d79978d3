//! End-to-end checks of the HTTP surface over in-memory seams.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use branchwatch::api::create_router;
use branchwatch::domain::{
    AggregateReport, BranchCredentials, BranchDescriptor, Category, DateRange, FleetStatistics,
    HealthStatus, QueryShape, ReportStatus,
};
use branchwatch::services::{
    BranchSession, MarginReportTotals, RawSummary, SalesLedgerTotals, StaticBranchRegistry,
};
use branchwatch::{
    AppConfig, BranchError, BranchRegistry, BranchwatchError, LivenessProbe, RemoteConnector,
    Runtime,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn branch(id: &str, category: Category) -> BranchDescriptor {
    BranchDescriptor {
        id: id.to_string(),
        name: format!("Branch {}", id),
        host: format!("{}.branches.internal", id),
        port: 5432,
        database: "retail".to_string(),
        credentials: BranchCredentials::new("reader", "secret"),
        category,
    }
}

fn ledger(gross: Decimal, profit: Decimal, margin: Decimal) -> Option<RawSummary> {
    Some(RawSummary::SalesLedger(SalesLedgerTotals {
        gross_sales: gross,
        recorded_profit: profit,
        mean_row_margin: margin,
        rows: 3,
    }))
}

struct UnavailableRegistry;

#[async_trait]
impl BranchRegistry for UnavailableRegistry {
    async fn list_branches(
        &self,
        _category: Option<Category>,
    ) -> branchwatch::Result<Vec<BranchDescriptor>> {
        Err(BranchwatchError::RegistryUnavailable(
            "directory refused connection".to_string(),
        ))
    }
}

/// Serves canned rows per branch id; ids without an entry refuse connections
#[derive(Default)]
struct CannedConnector {
    rows: HashMap<String, Option<RawSummary>>,
}

impl CannedConnector {
    fn with(mut self, id: &str, rows: Option<RawSummary>) -> Self {
        self.rows.insert(id.to_string(), rows);
        self
    }
}

#[async_trait]
impl RemoteConnector for CannedConnector {
    async fn connect(
        &self,
        branch: &BranchDescriptor,
        _deadline: Duration,
    ) -> Result<Box<dyn BranchSession>, BranchError> {
        match self.rows.get(&branch.id) {
            Some(rows) => Ok(Box::new(CannedSession { rows: *rows })),
            None => Err(BranchError::ConnectFailed(format!(
                "connection refused by {}",
                branch.address()
            ))),
        }
    }
}

struct CannedSession {
    rows: Option<RawSummary>,
}

#[async_trait]
impl BranchSession for CannedSession {
    async fn fetch_summary(
        &mut self,
        _shape: QueryShape,
        _range: &DateRange,
    ) -> Result<Option<RawSummary>, BranchError> {
        Ok(self.rows)
    }

    async fn ping(&mut self) -> Result<(), BranchError> {
        Ok(())
    }

    async fn release(self: Box<Self>) {}
}

#[derive(Default)]
struct SelectiveLiveness {
    down: HashSet<String>,
}

#[async_trait]
impl LivenessProbe for SelectiveLiveness {
    async fn probe(&self, branch: &BranchDescriptor) -> Result<Duration, BranchError> {
        if self.down.contains(&branch.id) {
            Err(BranchError::Unreachable(format!(
                "0 of 2 attempts answered at {}",
                branch.address()
            )))
        } else {
            Ok(Duration::from_millis(4))
        }
    }
}

fn fleet() -> Vec<BranchDescriptor> {
    vec![
        branch("s-1", Category::Supermarket),
        branch("s-2", Category::Supermarket),
        branch("s-3", Category::Supermarket),
        branch("h-1", Category::HardwareStore),
        branch("m-1", Category::MultiFormat),
    ]
}

fn app() -> Router {
    let connector = CannedConnector::default()
        .with("s-1", ledger(dec!(1190), dec!(100), dec!(10)))
        .with("s-2", ledger(dec!(2380), dec!(200), dec!(20)))
        .with("s-3", None)
        .with(
            "h-1",
            Some(RawSummary::PrecomputedMargin(MarginReportTotals {
                revenue: dec!(500),
                cost: dec!(400),
                mean_margin: dec!(20),
                rows: 12,
            })),
        );
    let liveness = SelectiveLiveness {
        down: ["m-1".to_string()].into_iter().collect(),
    };

    let runtime = Runtime::assemble(
        &AppConfig::default(),
        Arc::new(StaticBranchRegistry::new(fleet(), &Category::ALL)),
        Arc::new(connector),
        Arc::new(liveness),
    );
    create_router(runtime.app_state())
}

fn degraded_app() -> Router {
    let runtime = Runtime::assemble(
        &AppConfig::default(),
        Arc::new(UnavailableRegistry),
        Arc::new(CannedConnector::default()),
        Arc::new(SelectiveLiveness::default()),
    );
    create_router(runtime.app_state())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_dashboard_rejects_missing_dates() {
    let (status, body) = send(
        app(),
        post_json("/api/dashboard/financial", r#"{"start_date":"2024-01-01"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "end_date is required");
}

#[tokio::test]
async fn test_dashboard_rejects_empty_body() {
    let (status, _) = send(app(), post_json("/api/dashboard/financial", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_reports_undecodable_fields() {
    let (status, body) = send(
        app(),
        post_json(
            "/api/dashboard/financial",
            r#"{"start_date":"2024-13-45","end_date":"2024-01-31"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let message = error["error"].as_str().unwrap();
    assert!(message.contains("start_date"), "{message}");
    assert!(!message.contains("required"), "{message}");

    let (status, body) = send(
        app(),
        post_json(
            "/api/dashboard/financial",
            r#"{"start_date":"2024-01-01","end_date":"2024-01-31","category":"pharmacy"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let message = error["error"].as_str().unwrap();
    assert!(message.contains("category"), "{message}");
    assert!(!message.contains("required"), "{message}");
}

#[tokio::test]
async fn test_dashboard_without_body_asks_for_dates() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/dashboard/financial")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "start_date and end_date are required");
}

#[tokio::test]
async fn test_dashboard_aggregates_fleet() {
    let (status, body) = send(
        app(),
        post_json(
            "/api/dashboard/financial",
            r#"{"start_date":"2024-01-01","end_date":"2024-01-31"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let report: AggregateReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.status, ReportStatus::Complete);
    assert_eq!(report.branches_attempted, 5);
    assert_eq!(report.categories.len(), 3);

    let supermarket = report.category(Category::Supermarket).unwrap();
    assert_eq!(supermarket.branch_count, 2);
    assert_eq!(supermarket.margin, dec!(15));
    assert_eq!(supermarket.revenue, dec!(3570));
    // 1190 -> cost 1071, 2380 -> cost 2142
    assert_eq!(supermarket.cost, dec!(3213));
    assert_eq!(supermarket.profit, dec!(357));

    let hardware = report.category(Category::HardwareStore).unwrap();
    assert_eq!(hardware.branch_count, 1);
    assert_eq!(hardware.profit, dec!(100));

    let multi = report.category(Category::MultiFormat).unwrap();
    assert_eq!(multi.branch_count, 0);
    assert_eq!(multi.margin, Decimal::ZERO);

    // (15 * 2 + 20 * 1) / 3
    assert_eq!(report.total.branch_count, 3);
    assert_eq!(report.total.margin.round_dp(4), dec!(16.6667));
    assert_eq!(report.total.revenue, dec!(4070));
}

#[tokio::test]
async fn test_dashboard_get_with_category_filter() {
    let (status, body) = send(
        app(),
        get("/api/dashboard/financial?start_date=2024-01-01&end_date=2024-01-31&category=hardware_store"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let report: AggregateReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.branches_attempted, 1);
    assert_eq!(report.total.branch_count, 1);
    assert_eq!(
        report.category(Category::Supermarket).unwrap().branch_count,
        0
    );
}

#[tokio::test]
async fn test_dashboard_degrades_when_registry_is_down() {
    let (status, body) = send(
        degraded_app(),
        post_json(
            "/api/dashboard/financial",
            r#"{"start_date":"2024-01-01","end_date":"2024-01-31"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let report: AggregateReport = serde_json::from_slice(&body).unwrap();
    assert!(report.is_degraded());
    assert!(report.message.is_some());
    assert_eq!(report.categories.len(), 3);
    assert!(report
        .categories
        .iter()
        .all(|c| c.branch_count == 0 && c.revenue.is_zero() && c.margin.is_zero()));
    assert!(report.total.revenue.is_zero());
}

#[tokio::test]
async fn test_health_list_keeps_registry_order() {
    let (status, body) = send(app(), get("/api/health/branches")).await;
    assert_eq!(status, StatusCode::OK);

    let statuses: Vec<HealthStatus> = serde_json::from_slice(&body).unwrap();
    let ids: Vec<&str> = statuses.iter().map(|s| s.branch_id.as_str()).collect();
    assert_eq!(ids, vec!["s-1", "s-2", "s-3", "h-1", "m-1"]);

    let down = &statuses[4];
    assert!(!down.reachable);
    assert!(!down.database_reachable);
    assert!(down.error.is_some());
    assert!(statuses[..4].iter().all(|s| s.operative()));
}

#[tokio::test]
async fn test_health_by_id() {
    let (status, body) = send(app(), get("/api/health/branches/h-1")).await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.branch_id, "h-1");
    assert!(health.operative());

    let (status, _) = send(app(), get("/api/health/branches/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fleet_statistics() {
    let (status, body) = send(app(), get("/api/health/stats")).await;
    assert_eq!(status, StatusCode::OK);

    let stats: FleetStatistics = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.reachable, 4);
    assert_eq!(stats.operative, 4);
    assert_eq!(stats.operative_pct, dec!(80));
}

#[tokio::test]
async fn test_health_unavailable_without_registry() {
    let (status, _) = send(degraded_app(), get("/api/health/branches")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = send(degraded_app(), get("/api/health/stats")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_liveness_and_metrics() {
    let (status, body) = send(app(), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    let live: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(live["status"], "ok");

    let (status, body) = send(app(), get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("branchwatch_aggregation_passes_total"));
}
