//! Final reduction of a fan-out pass into an [`AggregateReport`], plus the
//! all-zero fallback used when the branch list itself is unavailable.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::{
    AggregateReport, Category, CategoryAccumulator, CategoryReport, DateRange, ReportStatus,
    TotalReport,
};

/// Message attached to the fallback report
pub const DEGRADED_MESSAGE: &str =
    "Branch directory unavailable; figures are empty until the directory recovers";

pub struct ResultReducer;

impl ResultReducer {
    /// One empty accumulator per category
    pub fn accumulators() -> BTreeMap<Category, CategoryAccumulator> {
        Category::ALL
            .iter()
            .map(|c| (*c, CategoryAccumulator::new(*c)))
            .collect()
    }

    /// Finalize every category and derive the fleet total
    pub fn reduce(
        pass_id: Uuid,
        range: DateRange,
        branches_attempted: u32,
        accumulators: BTreeMap<Category, CategoryAccumulator>,
    ) -> AggregateReport {
        let mut accumulators = accumulators;
        let categories: Vec<CategoryReport> = Category::ALL
            .iter()
            .map(|c| {
                accumulators
                    .remove(c)
                    .unwrap_or_else(|| CategoryAccumulator::new(*c))
                    .finalize()
            })
            .collect();

        let total = Self::total(&categories);

        AggregateReport {
            pass_id,
            status: ReportStatus::Complete,
            message: None,
            start_date: range.start,
            end_date: range.end,
            generated_at: Utc::now(),
            branches_attempted,
            categories,
            total,
        }
    }

    /// Sums across categories; margin is weighted by contributing-branch count
    pub fn total(categories: &[CategoryReport]) -> TotalReport {
        let mut total = TotalReport::zero();
        let mut weighted_margin = Decimal::ZERO;

        for category in categories {
            total.revenue += category.revenue;
            total.cost += category.cost;
            total.profit += category.profit;
            total.branch_count += category.branch_count;
            weighted_margin += category.margin * Decimal::from(category.branch_count);
        }

        if total.branch_count > 0 {
            total.margin = weighted_margin / Decimal::from(total.branch_count);
        }

        total
    }

    /// Structurally valid report with every figure zeroed
    pub fn fallback(pass_id: Uuid, range: DateRange, message: impl Into<String>) -> AggregateReport {
        let categories: Vec<CategoryReport> =
            Category::ALL.iter().map(|c| CategoryReport::empty(*c)).collect();

        AggregateReport {
            pass_id,
            status: ReportStatus::Degraded,
            message: Some(message.into()),
            start_date: range.start,
            end_date: range.end,
            generated_at: Utc::now(),
            branches_attempted: 0,
            categories,
            total: TotalReport::zero(),
        }
    }
}
