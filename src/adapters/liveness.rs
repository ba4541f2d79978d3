use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::debug;

use crate::domain::BranchDescriptor;
use crate::error::BranchError;
use crate::services::health_probe::LivenessProbe;

/// Reachability via repeated TCP connects to the branch store port
#[derive(Debug, Clone)]
pub struct TcpLivenessProbe {
    attempts: u32,
    min_replies: u32,
    timeout: Duration,
}

impl TcpLivenessProbe {
    pub fn new(attempts: u32, min_replies: u32, timeout: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            min_replies: min_replies.max(1),
            timeout,
        }
    }
}

#[async_trait]
impl LivenessProbe for TcpLivenessProbe {
    async fn probe(&self, branch: &BranchDescriptor) -> Result<Duration, BranchError> {
        if branch.host.trim().is_empty() {
            return Err(BranchError::IncompleteDescriptor(format!(
                "branch {} has no host",
                branch.id
            )));
        }

        let address = branch.address();
        let mut replies = Vec::with_capacity(self.attempts as usize);
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            let started = Instant::now();
            match tokio::time::timeout(self.timeout, TcpStream::connect(&address)).await {
                Ok(Ok(_stream)) => replies.push(started.elapsed()),
                Ok(Err(e)) => last_error = Some(e.to_string()),
                Err(_) => last_error = Some(format!("no answer within {:?}", self.timeout)),
            }
            debug!(branch = %branch.id, attempt, replies = replies.len(), "Liveness attempt");
        }

        if (replies.len() as u32) < self.min_replies {
            return Err(BranchError::Unreachable(format!(
                "{} of {} attempts answered at {} ({})",
                replies.len(),
                self.attempts,
                address,
                last_error.unwrap_or_else(|| "no reply".to_string())
            )));
        }

        let total: Duration = replies.iter().sum();
        Ok(total / replies.len() as u32)
    }
}
