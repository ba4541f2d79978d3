use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::services::{FanOutOrchestrator, Metrics, ParallelHealthProbe};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Sequential financial fan-out
    pub orchestrator: Arc<FanOutOrchestrator>,

    /// Concurrent fleet health probe
    pub probe: Arc<ParallelHealthProbe>,

    pub metrics: Arc<Metrics>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<FanOutOrchestrator>,
        probe: Arc<ParallelHealthProbe>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            orchestrator,
            probe,
            metrics,
            start_time: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
