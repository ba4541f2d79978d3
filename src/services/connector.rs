//! Deadline-bounded access to a single branch store.
//!
//! A connector hands out one [`BranchSession`] per visit. The deadline is passed
//! down to the driver (socket-level acquire timeout) and the whole open is also
//! wrapped in `tokio::time::timeout`; when the timer wins, the connect future is
//! dropped, which tears down the half-open connection instead of leaving it
//! running in the background.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::{BranchDescriptor, DateRange, QueryShape};
use crate::error::BranchError;
use crate::services::executor::RawSummary;

/// An open, single-use connection to one branch
#[async_trait]
pub trait BranchSession: Send {
    /// Run the category query for `shape` over `range`.
    /// `Ok(None)` means the store returned no rows.
    async fn fetch_summary(
        &mut self,
        shape: QueryShape,
        range: &DateRange,
    ) -> Result<Option<RawSummary>, BranchError>;

    /// Trivial round trip
    async fn ping(&mut self) -> Result<(), BranchError>;

    /// Close the connection. Never fails; errors are swallowed by implementors.
    async fn release(self: Box<Self>);
}

/// Opens sessions against branch stores
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    async fn connect(
        &self,
        branch: &BranchDescriptor,
        deadline: Duration,
    ) -> Result<Box<dyn BranchSession>, BranchError>;
}

/// Outcome of one connection attempt
pub enum ConnectionAttempt {
    Connected(Box<dyn BranchSession>),
    TimedOut,
    Failed(String),
}

impl std::fmt::Debug for ConnectionAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionAttempt::Connected(_) => write!(f, "Connected"),
            ConnectionAttempt::TimedOut => write!(f, "TimedOut"),
            ConnectionAttempt::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}

impl ConnectionAttempt {
    /// Collapse into a session or the matching per-branch error
    pub fn into_session(self, deadline: Duration) -> Result<Box<dyn BranchSession>, BranchError> {
        match self {
            ConnectionAttempt::Connected(session) => Ok(session),
            ConnectionAttempt::TimedOut => Err(BranchError::ConnectTimeout {
                elapsed_ms: deadline.as_millis() as u64,
            }),
            ConnectionAttempt::Failed(reason) => Err(BranchError::ConnectFailed(reason)),
        }
    }
}

/// Open a session to `branch`, giving up after `deadline`
pub async fn open(
    connector: &dyn RemoteConnector,
    branch: &BranchDescriptor,
    deadline: Duration,
) -> ConnectionAttempt {
    let started = Instant::now();

    match tokio::time::timeout(deadline, connector.connect(branch, deadline)).await {
        Ok(Ok(session)) => {
            debug!(
                branch = %branch.id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Branch connection opened"
            );
            ConnectionAttempt::Connected(session)
        }
        Ok(Err(BranchError::ConnectTimeout { .. })) | Err(_) => ConnectionAttempt::TimedOut,
        Ok(Err(e)) => ConnectionAttempt::Failed(e.to_string()),
    }
}
