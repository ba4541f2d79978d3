//! Output formatting for `branchwatch` commands.
//!
//! Supports two modes: human-readable tables (default) and JSON (--json).

use serde::Serialize;
use tabled::{Table, Tabled};

use crate::domain::{AggregateReport, FleetStatistics, HealthStatus};

/// Output mode for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct HealthRow {
    pub branch: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub reachable: String,
    pub latency_ms: String,
    pub database: String,
    pub error: String,
}

impl From<&HealthStatus> for HealthRow {
    fn from(status: &HealthStatus) -> Self {
        Self {
            branch: status.branch_id.clone(),
            name: status.name.clone(),
            category: status.category.to_string(),
            address: status.address.clone(),
            reachable: yes_no(status.reachable),
            latency_ms: status
                .latency_ms
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "-".to_string()),
            database: yes_no(status.database_reachable),
            error: status.error.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct CategoryRow {
    pub category: String,
    pub branches: u32,
    pub revenue: String,
    pub cost: String,
    pub profit: String,
    pub margin_pct: String,
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

/// Rows for the report table, with the fleet total last
pub fn report_rows(report: &AggregateReport) -> Vec<CategoryRow> {
    let mut rows: Vec<CategoryRow> = report
        .categories
        .iter()
        .map(|c| CategoryRow {
            category: c.category.to_string(),
            branches: c.branch_count,
            revenue: c.revenue.round_dp(2).to_string(),
            cost: c.cost.round_dp(2).to_string(),
            profit: c.profit.round_dp(2).to_string(),
            margin_pct: c.margin.round_dp(2).to_string(),
        })
        .collect();

    rows.push(CategoryRow {
        category: "TOTAL".to_string(),
        branches: report.total.branch_count,
        revenue: report.total.revenue.round_dp(2).to_string(),
        cost: report.total.cost.round_dp(2).to_string(),
        profit: report.total.profit.round_dp(2).to_string(),
        margin_pct: report.total.margin.round_dp(2).to_string(),
    });
    rows
}

/// Print a vec of Tabled + Serialize items in the chosen mode.
pub fn print_items<T: Tabled + Serialize>(items: &[T], mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Table => {
            if items.is_empty() {
                println!("(no results)");
            } else {
                let table = Table::new(items).to_string();
                println!("{table}");
            }
        }
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(items)?;
            println!("{json}");
        }
    }
    Ok(())
}

pub fn print_report(report: &AggregateReport, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputMode::Table => {
            println!(
                "Range {} .. {} | {} branches attempted | status {:?}",
                report.start_date, report.end_date, report.branches_attempted, report.status
            );
            if let Some(ref message) = report.message {
                print_warn(message);
            }
            print_items(&report_rows(report), mode)?;
        }
    }
    Ok(())
}

pub fn print_statuses(statuses: &[HealthStatus], mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(statuses)?),
        OutputMode::Table => {
            let rows: Vec<HealthRow> = statuses.iter().map(HealthRow::from).collect();
            print_items(&rows, mode)?;
        }
    }
    Ok(())
}

pub fn print_statistics(stats: &FleetStatistics, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(stats)?),
        OutputMode::Table => {
            print_kv("total", &stats.total.to_string());
            print_kv("reachable", &stats.reachable.to_string());
            print_kv("database reachable", &stats.database_reachable.to_string());
            print_kv("operative", &stats.operative.to_string());
            print_kv("operative %", &stats.operative_pct.to_string());
        }
    }
    Ok(())
}

/// Print a simple key-value pair.
pub fn print_kv(key: &str, value: &str) {
    println!("{key}: {value}");
}

/// Print a warning message.
pub fn print_warn(msg: &str) {
    println!("\x1b[33m{msg}\x1b[0m");
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("\x1b[31m{msg}\x1b[0m");
}
