//! Sequential fan-out across branch stores for the financial dashboard.
//!
//! Branches are visited strictly one at a time: connect, query, release, then
//! the next. Worst-case latency is `branches * (connect + query deadline)` and a
//! small branch server never sees more than one connection from a pass. The
//! accumulators are the only mutable state and are owned by the pass, so no
//! locking is involved.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::{AggregateReport, BranchDescriptor, BranchSummary, Category, DateRange};
use crate::error::BranchError;
use crate::services::connector::{self, RemoteConnector};
use crate::services::executor::CategoryQueryExecutor;
use crate::services::metrics::Metrics;
use crate::services::reducer::{ResultReducer, DEGRADED_MESSAGE};
use crate::services::registry::BranchRegistry;

pub struct FanOutOrchestrator {
    registry: Arc<dyn BranchRegistry>,
    connector: Arc<dyn RemoteConnector>,
    connect_deadline: Duration,
    executor: CategoryQueryExecutor,
    metrics: Arc<Metrics>,
}

impl FanOutOrchestrator {
    pub fn new(
        registry: Arc<dyn BranchRegistry>,
        connector: Arc<dyn RemoteConnector>,
        connect_deadline: Duration,
        executor: CategoryQueryExecutor,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            connector,
            connect_deadline,
            executor,
            metrics,
        }
    }

    /// Build the report for `range`. Never fails: a registry outage yields the
    /// zeroed fallback report, per-branch failures just drop that branch.
    pub async fn aggregate(&self, range: DateRange, category: Option<Category>) -> AggregateReport {
        let pass_id = Uuid::new_v4();
        let span = info_span!("aggregation_pass", %pass_id, %range);

        async move {
            self.metrics.inc_aggregation_passes();

            let branches = match self.registry.list_branches(category).await {
                Ok(branches) => branches,
                Err(e) => {
                    error!("Branch registry unavailable, returning fallback report: {}", e);
                    self.metrics.inc_fallback_reports();
                    return ResultReducer::fallback(pass_id, range, DEGRADED_MESSAGE);
                }
            };

            let mut accumulators = ResultReducer::accumulators();
            let mut contributed = 0u32;

            for branch in &branches {
                match self.visit(branch, &range).await {
                    Ok(summary) => {
                        if let Some(acc) = accumulators.get_mut(&branch.category) {
                            acc.record(branch, &summary);
                            contributed += 1;
                            self.metrics.inc_branches_contributed();
                        }
                    }
                    Err(e) => {
                        warn!(
                            branch = %branch.id,
                            category = %branch.category,
                            kind = e.kind(),
                            "Branch excluded: {}",
                            e
                        );
                        self.metrics.record_branch_failure(&e);
                    }
                }
            }

            info!(
                attempted = branches.len(),
                contributed,
                "Aggregation pass complete"
            );

            ResultReducer::reduce(pass_id, range, branches.len() as u32, accumulators)
        }
        .instrument(span)
        .await
    }

    /// Connect, query and release one branch
    async fn visit(
        &self,
        branch: &BranchDescriptor,
        range: &DateRange,
    ) -> Result<BranchSummary, BranchError> {
        branch.validate()?;

        let mut session = connector::open(self.connector.as_ref(), branch, self.connect_deadline)
            .await
            .into_session(self.connect_deadline)?;

        let result = self
            .executor
            .execute(session.as_mut(), branch.category.query_shape(), range)
            .await;

        session.release().await;
        debug!(branch = %branch.id, ok = result.is_ok(), "Branch connection released");

        result
    }
}
