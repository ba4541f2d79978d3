pub mod adapters;
pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::Runtime;
pub use config::AppConfig;
pub use domain::{
    AggregateReport, BranchDescriptor, BranchSummary, Category, CategoryReport, DateRange,
    FleetStatistics, HealthStatus, ReportStatus,
};
pub use error::{BranchError, BranchwatchError, Result};
pub use services::{
    BranchRegistry, FanOutOrchestrator, LivenessProbe, ParallelHealthProbe, RemoteConnector,
};
