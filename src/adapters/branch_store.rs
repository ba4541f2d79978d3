use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::{BranchDescriptor, DateRange, QueryShape};
use crate::error::BranchError;
use crate::services::connector::{BranchSession, RemoteConnector};
use crate::services::executor::{MarginReportTotals, RawSummary, SalesLedgerTotals};

/// Sales ledger rolled up over the range. `$3` is the tax factor.
const SALES_LEDGER_QUERY: &str = r#"
    SELECT
        COALESCE(SUM(total_amount), 0)::numeric AS gross_sales,
        COALESCE(SUM(profit), 0)::numeric AS recorded_profit,
        COALESCE(AVG(
            CASE WHEN total_amount <> 0
                THEN (total_amount - ((total_amount / $3) - profit) * $3) / total_amount * 100
            END
        ), 0)::numeric AS mean_row_margin,
        COUNT(*)::BIGINT AS row_count
    FROM sales
    WHERE sale_date::date BETWEEN $1 AND $2
    HAVING COUNT(*) > 0
"#;

const MARGIN_REPORT_QUERY: &str = r#"
    SELECT
        COALESCE(SUM(revenue), 0)::numeric AS revenue,
        COALESCE(SUM(cost), 0)::numeric AS cost,
        COALESCE(AVG(margin), 0)::numeric AS mean_margin,
        COUNT(*)::BIGINT AS row_count
    FROM margin_report
    WHERE report_date BETWEEN $1 AND $2
    HAVING COUNT(*) > 0
"#;

/// Opens one dedicated connection per branch visit. A refused connect fails
/// straight away instead of waiting out the deadline.
#[derive(Debug, Clone)]
pub struct PgBranchConnector {
    vat_factor: Decimal,
}

impl PgBranchConnector {
    pub fn new(vat_factor: Decimal) -> Self {
        Self { vat_factor }
    }

    fn connect_options(branch: &BranchDescriptor) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&branch.host)
            .port(branch.port)
            .database(&branch.database)
            .username(&branch.credentials.username)
            .password(branch.credentials.password())
            .application_name("branchwatch")
    }
}

#[async_trait]
impl RemoteConnector for PgBranchConnector {
    /// The deadline is enforced by the caller's timeout, which drops this
    /// future mid-handshake.
    #[instrument(skip(self, branch, _deadline), fields(branch = %branch.id))]
    async fn connect(
        &self,
        branch: &BranchDescriptor,
        _deadline: Duration,
    ) -> Result<Box<dyn BranchSession>, BranchError> {
        let conn = PgConnection::connect_with(&Self::connect_options(branch))
            .await
            .map_err(BranchError::connect)?;

        Ok(Box::new(PgBranchSession {
            conn,
            vat_factor: self.vat_factor,
        }))
    }
}

/// Live connection to one branch store
pub struct PgBranchSession {
    conn: PgConnection,
    vat_factor: Decimal,
}

impl PgBranchSession {
    async fn sales_ledger(&mut self, range: &DateRange) -> Result<Option<RawSummary>, BranchError> {
        let row = sqlx::query(SALES_LEDGER_QUERY)
            .bind(range.start)
            .bind(range.end)
            .bind(self.vat_factor)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(BranchError::query)?;

        row.map(|r| {
            Ok(RawSummary::SalesLedger(SalesLedgerTotals {
                gross_sales: r.try_get("gross_sales").map_err(BranchError::query)?,
                recorded_profit: r.try_get("recorded_profit").map_err(BranchError::query)?,
                mean_row_margin: r.try_get("mean_row_margin").map_err(BranchError::query)?,
                rows: r.try_get("row_count").map_err(BranchError::query)?,
            }))
        })
        .transpose()
    }

    async fn margin_report(&mut self, range: &DateRange) -> Result<Option<RawSummary>, BranchError> {
        let row = sqlx::query(MARGIN_REPORT_QUERY)
            .bind(range.start)
            .bind(range.end)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(BranchError::query)?;

        row.map(|r| {
            Ok(RawSummary::PrecomputedMargin(MarginReportTotals {
                revenue: r.try_get("revenue").map_err(BranchError::query)?,
                cost: r.try_get("cost").map_err(BranchError::query)?,
                mean_margin: r.try_get("mean_margin").map_err(BranchError::query)?,
                rows: r.try_get("row_count").map_err(BranchError::query)?,
            }))
        })
        .transpose()
    }
}

#[async_trait]
impl BranchSession for PgBranchSession {
    async fn fetch_summary(
        &mut self,
        shape: QueryShape,
        range: &DateRange,
    ) -> Result<Option<RawSummary>, BranchError> {
        match shape {
            QueryShape::SalesLedger => self.sales_ledger(range).await,
            QueryShape::PrecomputedMargin => self.margin_report(range).await,
        }
    }

    async fn ping(&mut self) -> Result<(), BranchError> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(BranchError::query)
    }

    async fn release(self: Box<Self>) {
        if let Err(e) = self.conn.close().await {
            debug!("Branch connection close failed: {}", e);
        } else {
            debug!("Branch connection closed");
        }
    }
}
