use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::BranchError;

/// Metrics collector for observability
#[derive(Debug, Default)]
pub struct Metrics {
    /// Aggregation passes run
    pub aggregation_passes: AtomicU64,
    /// Passes answered with the fallback report
    pub fallback_reports: AtomicU64,
    /// Branch summaries folded into a category
    pub branches_contributed: AtomicU64,
    pub incomplete_descriptors: AtomicU64,
    pub connect_timeouts: AtomicU64,
    pub connect_failures: AtomicU64,
    pub query_timeouts: AtomicU64,
    pub query_failures: AtomicU64,
    pub empty_results: AtomicU64,
    /// Concurrent probe passes run
    pub probe_passes: AtomicU64,
    /// Probe slots that degraded to a probe error
    pub probe_errors: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_aggregation_passes(&self) {
        self.aggregation_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback_reports(&self) {
        self.fallback_reports.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_branches_contributed(&self) {
        self.branches_contributed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_probe_passes(&self) {
        self.probe_passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a per-branch failure under its kind
    pub fn record_branch_failure(&self, err: &BranchError) {
        let counter = match err {
            BranchError::IncompleteDescriptor(_) => &self.incomplete_descriptors,
            BranchError::ConnectTimeout { .. } => &self.connect_timeouts,
            BranchError::ConnectFailed(_) | BranchError::Unreachable(_) => &self.connect_failures,
            BranchError::QueryTimeout { .. } => &self.query_timeouts,
            BranchError::QueryFailed(_) => &self.query_failures,
            BranchError::NoRows => &self.empty_results,
            BranchError::ProbeError(_) => &self.probe_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus format
    pub fn prometheus(&self) -> String {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);

        format!(
            r#"# HELP branchwatch_aggregation_passes_total Aggregation passes run
# TYPE branchwatch_aggregation_passes_total counter
branchwatch_aggregation_passes_total {}

# HELP branchwatch_fallback_reports_total Passes answered with the empty fallback report
# TYPE branchwatch_fallback_reports_total counter
branchwatch_fallback_reports_total {}

# HELP branchwatch_branches_contributed_total Branch summaries included in a report
# TYPE branchwatch_branches_contributed_total counter
branchwatch_branches_contributed_total {}

# HELP branchwatch_branch_failures_total Branches excluded from a report, by kind
# TYPE branchwatch_branch_failures_total counter
branchwatch_branch_failures_total{{kind="incomplete_descriptor"}} {}
branchwatch_branch_failures_total{{kind="connect_timeout"}} {}
branchwatch_branch_failures_total{{kind="connect_failed"}} {}
branchwatch_branch_failures_total{{kind="query_timeout"}} {}
branchwatch_branch_failures_total{{kind="query_failed"}} {}
branchwatch_branch_failures_total{{kind="no_rows"}} {}

# HELP branchwatch_probe_passes_total Concurrent health probe passes
# TYPE branchwatch_probe_passes_total counter
branchwatch_probe_passes_total {}

# HELP branchwatch_probe_errors_total Probe slots that failed internally
# TYPE branchwatch_probe_errors_total counter
branchwatch_probe_errors_total {}
"#,
            load(&self.aggregation_passes),
            load(&self.fallback_reports),
            load(&self.branches_contributed),
            load(&self.incomplete_descriptors),
            load(&self.connect_timeouts),
            load(&self.connect_failures),
            load(&self.query_timeouts),
            load(&self.query_failures),
            load(&self.empty_results),
            load(&self.probe_passes),
            load(&self.probe_errors),
        )
    }
}
