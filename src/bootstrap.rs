//! Process-scoped construction of the registry, connector and services.
//!
//! Everything here is built once at startup from [`AppConfig`] and shared by
//! reference; nothing holds credentials outside the registry.

use std::sync::Arc;
use tracing::info;

use crate::adapters::{PgBranchConnector, PostgresBranchRegistry, TcpLivenessProbe};
use crate::api::AppState;
use crate::config::{AppConfig, RegistrySource};
use crate::error::{BranchwatchError, Result};
use crate::services::{
    BranchRegistry, CategoryQueryExecutor, FanOutOrchestrator, LivenessProbe, Metrics,
    ParallelHealthProbe, RemoteConnector, StaticBranchRegistry,
};

/// Fully wired service graph
#[derive(Clone)]
pub struct Runtime {
    pub orchestrator: Arc<FanOutOrchestrator>,
    pub probe: Arc<ParallelHealthProbe>,
    pub metrics: Arc<Metrics>,
}

impl Runtime {
    /// Build from config using the production adapters
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let registry: Arc<dyn BranchRegistry> = match config.registry.source {
            RegistrySource::Static => {
                let registry = StaticBranchRegistry::new(
                    config.branches.clone(),
                    &config.registry.categories,
                );
                info!(branches = registry.len(), "Using static branch registry");
                Arc::new(registry)
            }
            RegistrySource::Postgres => {
                let url = config.registry.url.as_deref().ok_or_else(|| {
                    BranchwatchError::InvalidConfig("registry.url is not set".into())
                })?;
                info!("Using directory-database branch registry");
                Arc::new(
                    PostgresBranchRegistry::new(
                        url,
                        config.registry.max_connections,
                        config.registry.categories.clone(),
                    )
                    .await?,
                )
            }
        };

        let connector: Arc<dyn RemoteConnector> =
            Arc::new(PgBranchConnector::new(config.fanout.vat_factor));
        let liveness: Arc<dyn LivenessProbe> = Arc::new(TcpLivenessProbe::new(
            config.probe.liveness_attempts,
            config.probe.liveness_min_replies,
            config.probe.liveness_timeout(),
        ));

        Ok(Self::assemble(config, registry, connector, liveness))
    }

    /// Wire services around the given seams
    pub fn assemble(
        config: &AppConfig,
        registry: Arc<dyn BranchRegistry>,
        connector: Arc<dyn RemoteConnector>,
        liveness: Arc<dyn LivenessProbe>,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());

        let orchestrator = Arc::new(FanOutOrchestrator::new(
            Arc::clone(&registry),
            Arc::clone(&connector),
            config.fanout.connect_timeout(),
            CategoryQueryExecutor::new(config.fanout.query_timeout(), config.fanout.vat_factor),
            Arc::clone(&metrics),
        ));

        let probe = Arc::new(ParallelHealthProbe::new(
            registry,
            connector,
            liveness,
            config.probe.database_timeout(),
            Arc::clone(&metrics),
        ));

        Self {
            orchestrator,
            probe,
            metrics,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.probe),
            Arc::clone(&self.metrics),
        )
    }
}
