//! Concurrent liveness + database probing across the whole fleet.
//!
//! Every branch gets its own task and writes only its own slot; results come
//! back in input order. A panicking or otherwise broken probe task degrades to
//! a probe-error status for that slot and never aborts the batch.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::{BranchDescriptor, FleetStatistics, HealthStatus};
use crate::error::{BranchError, Result};
use crate::services::connector::{self, RemoteConnector};
use crate::services::metrics::Metrics;
use crate::services::registry::BranchRegistry;

/// Network-level reachability check
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Round-trip latency when the host answered enough attempts
    async fn probe(&self, branch: &BranchDescriptor) -> std::result::Result<Duration, BranchError>;
}

#[derive(Clone)]
pub struct ParallelHealthProbe {
    registry: Arc<dyn BranchRegistry>,
    connector: Arc<dyn RemoteConnector>,
    liveness: Arc<dyn LivenessProbe>,
    database_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl ParallelHealthProbe {
    pub fn new(
        registry: Arc<dyn BranchRegistry>,
        connector: Arc<dyn RemoteConnector>,
        liveness: Arc<dyn LivenessProbe>,
        database_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            connector,
            liveness,
            database_timeout,
            metrics,
        }
    }

    /// Probe every registered branch
    pub async fn probe_registry(&self) -> Result<Vec<HealthStatus>> {
        let branches = self.registry.list_branches(None).await?;
        Ok(self.probe_all(&branches).await)
    }

    /// Probe one branch by id; `None` when the id is not registered
    pub async fn probe_one(&self, id: &str) -> Result<Option<HealthStatus>> {
        match self.registry.find_branch(id).await? {
            Some(branch) => Ok(self.probe_all(std::slice::from_ref(&branch)).await.pop()),
            None => Ok(None),
        }
    }

    /// Fleet counts over a fresh probe pass
    pub async fn fleet_statistics(&self) -> Result<FleetStatistics> {
        let statuses = self.probe_registry().await?;
        Ok(FleetStatistics::from_statuses(&statuses))
    }

    /// Same length and order as `branches`, whatever happens to each probe
    pub async fn probe_all(&self, branches: &[BranchDescriptor]) -> Vec<HealthStatus> {
        self.metrics.inc_probe_passes();
        let started = Instant::now();

        let tasks: Vec<_> = branches
            .iter()
            .cloned()
            .map(|branch| {
                let connector = Arc::clone(&self.connector);
                let liveness = Arc::clone(&self.liveness);
                let database_timeout = self.database_timeout;
                tokio::spawn(async move {
                    probe_branch(&branch, liveness.as_ref(), connector.as_ref(), database_timeout)
                        .await
                })
            })
            .collect();

        let results = join_all(tasks).await;

        let statuses: Vec<HealthStatus> = results
            .into_iter()
            .zip(branches)
            .map(|(result, branch)| match result {
                Ok(status) => status,
                Err(e) => {
                    let err = BranchError::ProbeError(e.to_string());
                    error!(branch = %branch.id, kind = err.kind(), "Probe task failed: {}", e);
                    self.metrics.record_branch_failure(&err);
                    HealthStatus::probe_error(branch, &err)
                }
            })
            .collect();

        info!(
            branches = statuses.len(),
            operative = statuses.iter().filter(|s| s.operative()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Health probe pass complete"
        );

        statuses
    }
}

/// Liveness first; the database probe only runs when the host answered
async fn probe_branch(
    branch: &BranchDescriptor,
    liveness: &dyn LivenessProbe,
    connector: &dyn RemoteConnector,
    database_timeout: Duration,
) -> HealthStatus {
    let latency = match liveness.probe(branch).await {
        Ok(latency) => latency.as_millis() as u64,
        Err(e) => {
            debug!(branch = %branch.id, "Liveness probe failed: {}", e);
            return HealthStatus::unreachable(branch, e.to_string());
        }
    };

    match probe_database(branch, connector, database_timeout).await {
        Ok(()) => HealthStatus::operational(branch, latency),
        Err(e) => {
            warn!(branch = %branch.id, kind = e.kind(), "Database probe failed: {}", e);
            HealthStatus::database_down(branch, latency, e.to_string())
        }
    }
}

/// Open + `SELECT 1` inside one budget
async fn probe_database(
    branch: &BranchDescriptor,
    connector: &dyn RemoteConnector,
    budget: Duration,
) -> std::result::Result<(), BranchError> {
    branch.validate()?;
    let started = Instant::now();

    let mut session = connector::open(connector, branch, budget)
        .await
        .into_session(budget)?;

    let remaining = budget.saturating_sub(started.elapsed());
    let ping = tokio::time::timeout(remaining, session.ping()).await;
    session.release().await;

    match ping {
        Ok(result) => result,
        Err(_) => Err(BranchError::QueryTimeout {
            elapsed_ms: budget.as_millis() as u64,
        }),
    }
}
