pub mod connector;
pub mod executor;
pub mod health_probe;
pub mod metrics;
pub mod orchestrator;
pub mod reducer;
pub mod registry;

pub use connector::{BranchSession, ConnectionAttempt, RemoteConnector};
pub use executor::{CategoryQueryExecutor, MarginReportTotals, RawSummary, SalesLedgerTotals};
pub use health_probe::{LivenessProbe, ParallelHealthProbe};
pub use metrics::Metrics;
pub use orchestrator::FanOutOrchestrator;
pub use reducer::ResultReducer;
pub use registry::{BranchRegistry, StaticBranchRegistry};
