//! Category query execution and reduction of the two result shapes into a
//! [`BranchSummary`].

use rust_decimal::Decimal;
use std::time::Duration;
use tracing::instrument;

use crate::domain::{BranchSummary, DateRange, QueryShape};
use crate::error::BranchError;
use crate::services::connector::BranchSession;

/// Aggregates read from a raw sales ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesLedgerTotals {
    /// Sum of gross (tax-inclusive) sale amounts
    pub gross_sales: Decimal,
    /// Sum of the profit recorded on each sale
    pub recorded_profit: Decimal,
    /// Mean of per-row margins, percent
    pub mean_row_margin: Decimal,
    pub rows: i64,
}

impl SalesLedgerTotals {
    /// Cost is the tax-backed-out residual `((gross / vat) - profit) * vat`.
    /// The double tax adjustment is intentional and must not be simplified.
    pub fn into_summary(self, vat_factor: Decimal) -> Option<BranchSummary> {
        if self.rows <= 0 {
            return None;
        }

        let cost = ((self.gross_sales / vat_factor) - self.recorded_profit) * vat_factor;
        let profit = self.gross_sales - cost;

        Some(BranchSummary {
            revenue: self.gross_sales,
            cost,
            profit,
            margin: self.mean_row_margin,
        })
    }
}

/// Aggregates read from a precomputed margin report table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginReportTotals {
    pub revenue: Decimal,
    pub cost: Decimal,
    /// Mean of the stored margins, percent
    pub mean_margin: Decimal,
    pub rows: i64,
}

impl MarginReportTotals {
    pub fn into_summary(self) -> Option<BranchSummary> {
        if self.rows <= 0 {
            return None;
        }

        Some(BranchSummary {
            revenue: self.revenue,
            cost: self.cost,
            profit: self.revenue - self.cost,
            margin: self.mean_margin,
        })
    }
}

/// What a session hands back before reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSummary {
    SalesLedger(SalesLedgerTotals),
    PrecomputedMargin(MarginReportTotals),
}

impl RawSummary {
    pub fn into_summary(self, vat_factor: Decimal) -> Option<BranchSummary> {
        match self {
            RawSummary::SalesLedger(totals) => totals.into_summary(vat_factor),
            RawSummary::PrecomputedMargin(totals) => totals.into_summary(),
        }
    }
}

/// Runs category queries under a deadline
#[derive(Debug, Clone, Copy)]
pub struct CategoryQueryExecutor {
    deadline: Duration,
    vat_factor: Decimal,
}

impl CategoryQueryExecutor {
    pub fn new(deadline: Duration, vat_factor: Decimal) -> Self {
        Self {
            deadline,
            vat_factor,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Query one branch. No rows and deadline expiry both come back as errors
    /// so the caller can drop the branch.
    #[instrument(skip(self, session))]
    pub async fn execute(
        &self,
        session: &mut dyn BranchSession,
        shape: QueryShape,
        range: &DateRange,
    ) -> Result<BranchSummary, BranchError> {
        let raw = tokio::time::timeout(self.deadline, session.fetch_summary(shape, range))
            .await
            .map_err(|_| BranchError::QueryTimeout {
                elapsed_ms: self.deadline.as_millis() as u64,
            })??;

        raw.and_then(|r| r.into_summary(self.vat_factor))
            .ok_or(BranchError::NoRows)
    }
}
