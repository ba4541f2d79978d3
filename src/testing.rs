//! In-memory fakes for the registry, connector and liveness seams.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::{BranchCredentials, BranchDescriptor, Category, DateRange, QueryShape};
use crate::error::{BranchError, BranchwatchError, Result};
use crate::services::connector::{BranchSession, RemoteConnector};
use crate::services::executor::{MarginReportTotals, RawSummary, SalesLedgerTotals};
use crate::services::health_probe::LivenessProbe;
use crate::services::registry::BranchRegistry;

pub fn branch(id: &str, category: Category) -> BranchDescriptor {
    BranchDescriptor {
        id: id.to_string(),
        name: format!("Branch {id}"),
        host: format!("{id}.branches.internal"),
        port: 5432,
        database: "pos".to_string(),
        credentials: BranchCredentials::new("report", "pw"),
        category,
    }
}

/// Sales-ledger result with the given gross, recorded profit and mean margin
pub fn ledger(gross_sales: Decimal, recorded_profit: Decimal, margin: Decimal) -> RawSummary {
    RawSummary::SalesLedger(SalesLedgerTotals {
        gross_sales,
        recorded_profit,
        mean_row_margin: margin,
        rows: 1,
    })
}

pub fn margin_report(revenue: Decimal, cost: Decimal, margin: Decimal) -> RawSummary {
    RawSummary::PrecomputedMargin(MarginReportTotals {
        revenue,
        cost,
        mean_margin: margin,
        rows: 1,
    })
}

pub struct FakeRegistry {
    branches: Vec<BranchDescriptor>,
    fail: bool,
}

impl FakeRegistry {
    pub fn new(branches: Vec<BranchDescriptor>) -> Self {
        Self {
            branches,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            branches: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl BranchRegistry for FakeRegistry {
    async fn list_branches(&self, category: Option<Category>) -> Result<Vec<BranchDescriptor>> {
        if self.fail {
            return Err(BranchwatchError::RegistryUnavailable(
                "directory connection refused".into(),
            ));
        }
        Ok(self
            .branches
            .iter()
            .filter(|b| category.map_or(true, |c| b.category == c))
            .cloned()
            .collect())
    }
}

/// How a fake branch store behaves
#[derive(Debug, Clone, Copy)]
pub enum FakeStore {
    Rows(RawSummary),
    NoRows,
    ConnectHang,
    ConnectFail,
    QueryHang,
    QueryFail,
    PingFail,
}

#[derive(Default)]
pub struct FakeConnector {
    stores: HashMap<String, FakeStore>,
    connects: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, store: FakeStore) -> Self {
        self.stores.insert(id.to_string(), store);
        self
    }

    /// Branch ids that were asked to connect, in order
    pub fn connects(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.connects)
    }

    /// Number of sessions released
    pub fn released(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.released)
    }
}

#[async_trait]
impl RemoteConnector for FakeConnector {
    async fn connect(
        &self,
        branch: &BranchDescriptor,
        _deadline: Duration,
    ) -> std::result::Result<Box<dyn BranchSession>, BranchError> {
        self.connects
            .lock()
            .expect("connects lock")
            .push(branch.id.clone());

        let store = self
            .stores
            .get(&branch.id)
            .copied()
            .unwrap_or(FakeStore::ConnectFail);

        match store {
            FakeStore::ConnectHang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            FakeStore::ConnectFail => Err(BranchError::ConnectFailed(format!(
                "connection refused by {}",
                branch.address()
            ))),
            store => Ok(Box::new(FakeSession {
                store,
                released: Arc::clone(&self.released),
            })),
        }
    }
}

struct FakeSession {
    store: FakeStore,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl BranchSession for FakeSession {
    async fn fetch_summary(
        &mut self,
        _shape: QueryShape,
        _range: &DateRange,
    ) -> std::result::Result<Option<RawSummary>, BranchError> {
        match self.store {
            FakeStore::Rows(raw) => Ok(Some(raw)),
            FakeStore::QueryHang => std::future::pending().await,
            FakeStore::QueryFail => Err(BranchError::QueryFailed("relation missing".into())),
            _ => Ok(None),
        }
    }

    async fn ping(&mut self) -> std::result::Result<(), BranchError> {
        match self.store {
            FakeStore::PingFail => Err(BranchError::QueryFailed("server closed connection".into())),
            FakeStore::QueryHang => std::future::pending().await,
            _ => Ok(()),
        }
    }

    async fn release(self: Box<Self>) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeLiveness {
    down: HashSet<String>,
    panics: HashSet<String>,
    latencies: HashMap<String, Duration>,
}

impl FakeLiveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn down(mut self, id: &str) -> Self {
        self.down.insert(id.to_string());
        self
    }

    pub fn panics(mut self, id: &str) -> Self {
        self.panics.insert(id.to_string());
        self
    }

    pub fn with_latency(mut self, id: &str, latency: Duration) -> Self {
        self.latencies.insert(id.to_string(), latency);
        self
    }
}

#[async_trait]
impl LivenessProbe for FakeLiveness {
    async fn probe(&self, branch: &BranchDescriptor) -> std::result::Result<Duration, BranchError> {
        if self.panics.contains(&branch.id) {
            panic!("liveness probe crashed for {}", branch.id);
        }
        if self.down.contains(&branch.id) {
            return Err(BranchError::Unreachable(format!(
                "0 of 2 attempts answered at {}",
                branch.address()
            )));
        }
        Ok(self
            .latencies
            .get(&branch.id)
            .copied()
            .unwrap_or(Duration::from_millis(5)))
    }
}
