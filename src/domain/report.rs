use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::branch::{BranchDescriptor, Category};

/// Financial summary of one branch over a date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSummary {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    /// Margin in percent
    pub margin: Decimal,
}

/// A branch that made it into a category total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchContribution {
    pub id: String,
    pub name: String,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub margin: Decimal,
}

/// Running totals for one category during a fan-out pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAccumulator {
    category: Category,
    revenue: Decimal,
    cost: Decimal,
    profit: Decimal,
    margin_sum: Decimal,
    contributing: u32,
    branches: Vec<BranchContribution>,
}

impl CategoryAccumulator {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            revenue: Decimal::ZERO,
            cost: Decimal::ZERO,
            profit: Decimal::ZERO,
            margin_sum: Decimal::ZERO,
            contributing: 0,
            branches: Vec::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn contributing(&self) -> u32 {
        self.contributing
    }

    /// Fold one successful branch into the running totals
    pub fn record(&mut self, branch: &BranchDescriptor, summary: &BranchSummary) {
        self.revenue += summary.revenue;
        self.cost += summary.cost;
        self.profit += summary.profit;
        self.margin_sum += summary.margin;
        self.contributing += 1;
        self.branches.push(BranchContribution {
            id: branch.id.clone(),
            name: branch.name.clone(),
            revenue: summary.revenue,
            cost: summary.cost,
            profit: summary.profit,
            margin: summary.margin,
        });
    }

    /// Close the accumulator. Margin is the plain mean of the contributing
    /// branch margins, never re-derived from revenue and cost.
    pub fn finalize(self) -> CategoryReport {
        let margin = if self.contributing == 0 {
            Decimal::ZERO
        } else {
            self.margin_sum / Decimal::from(self.contributing)
        };

        CategoryReport {
            category: self.category,
            revenue: self.revenue,
            cost: self.cost,
            profit: self.profit,
            margin,
            branch_count: self.contributing,
            branches: self.branches,
        }
    }
}

/// Finalized figures for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: Category,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub margin: Decimal,
    pub branch_count: u32,
    pub branches: Vec<BranchContribution>,
}

impl CategoryReport {
    pub fn empty(category: Category) -> Self {
        CategoryAccumulator::new(category).finalize()
    }
}

/// Fleet-wide figures derived from the category reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalReport {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    /// Category margins weighted by contributing-branch count
    pub margin: Decimal,
    pub branch_count: u32,
}

impl TotalReport {
    pub fn zero() -> Self {
        Self {
            revenue: Decimal::ZERO,
            cost: Decimal::ZERO,
            profit: Decimal::ZERO,
            margin: Decimal::ZERO,
            branch_count: 0,
        }
    }
}

/// Whether the report reflects a full pass or a fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Complete,
    Degraded,
}

/// Result of one aggregation request. Always structurally valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub pass_id: Uuid,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub branches_attempted: u32,
    pub categories: Vec<CategoryReport>,
    pub total: TotalReport,
}

impl AggregateReport {
    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn is_degraded(&self) -> bool {
        self.status == ReportStatus::Degraded
    }
}
