use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::branch::{BranchDescriptor, Category};
use crate::error::BranchError;

/// Probe result for a single branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub branch_id: String,
    pub name: String,
    pub category: Category,
    pub address: String,
    /// Network liveness probe succeeded
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Database open + round trip succeeded
    pub database_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    fn blank(branch: &BranchDescriptor) -> Self {
        Self {
            branch_id: branch.id.clone(),
            name: branch.name.clone(),
            category: branch.category,
            address: branch.address(),
            reachable: false,
            latency_ms: None,
            database_reachable: false,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unreachable(branch: &BranchDescriptor, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::blank(branch)
        }
    }

    pub fn database_down(branch: &BranchDescriptor, latency_ms: u64, error: impl Into<String>) -> Self {
        Self {
            reachable: true,
            latency_ms: Some(latency_ms),
            error: Some(error.into()),
            ..Self::blank(branch)
        }
    }

    pub fn operational(branch: &BranchDescriptor, latency_ms: u64) -> Self {
        Self {
            reachable: true,
            latency_ms: Some(latency_ms),
            database_reachable: true,
            ..Self::blank(branch)
        }
    }

    /// Uniform status for a slot whose probe task itself blew up
    pub fn probe_error(branch: &BranchDescriptor, error: &BranchError) -> Self {
        Self::unreachable(branch, error.to_string())
    }

    pub fn operative(&self) -> bool {
        self.reachable && self.database_reachable
    }
}

/// Fleet-level counts derived from a full probe pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetStatistics {
    pub total: u32,
    pub reachable: u32,
    pub database_reachable: u32,
    pub operative: u32,
    /// Percentage of fully operative branches, two decimals
    pub operative_pct: Decimal,
    pub checked_at: DateTime<Utc>,
}

impl FleetStatistics {
    pub fn from_statuses(statuses: &[HealthStatus]) -> Self {
        let mut stats = Self {
            total: 0,
            reachable: 0,
            database_reachable: 0,
            operative: 0,
            operative_pct: Decimal::ZERO,
            checked_at: Utc::now(),
        };

        for status in statuses {
            stats.total += 1;
            if status.reachable {
                stats.reachable += 1;
            }
            if status.database_reachable {
                stats.database_reachable += 1;
            }
            if status.operative() {
                stats.operative += 1;
            }
        }

        if stats.total > 0 {
            stats.operative_pct = (Decimal::from(stats.operative) * Decimal::ONE_HUNDRED
                / Decimal::from(stats.total))
            .round_dp(2);
        }

        stats
    }
}
