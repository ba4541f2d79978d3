use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{BranchError, BranchwatchError};

/// Business vertical a branch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Supermarket,
    HardwareStore,
    MultiFormat,
}

/// How a branch's store is summarized for a date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// Raw sales rows; cost and margin are derived per row
    SalesLedger,
    /// Reporting table with revenue/cost/margin already computed
    PrecomputedMargin,
}

impl Category {
    /// Every category, in report order
    pub const ALL: [Category; 3] = [
        Category::Supermarket,
        Category::HardwareStore,
        Category::MultiFormat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Supermarket => "supermarket",
            Category::HardwareStore => "hardware_store",
            Category::MultiFormat => "multi_format",
        }
    }

    pub fn query_shape(&self) -> QueryShape {
        match self {
            Category::Supermarket | Category::MultiFormat => QueryShape::SalesLedger,
            Category::HardwareStore => QueryShape::PrecomputedMargin,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = BranchwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "supermarket" => Ok(Category::Supermarket),
            "hardware_store" | "hardware" => Ok(Category::HardwareStore),
            "multi_format" | "multiformat" => Ok(Category::MultiFormat),
            other => Err(BranchwatchError::UnknownCategory(other.to_string())),
        }
    }
}

/// Login for a branch store. The password never shows up in `Debug` output.
#[derive(Clone, Deserialize)]
pub struct BranchCredentials {
    pub username: String,
    password: String,
}

impl BranchCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for BranchCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One retail branch and how to reach its store
#[derive(Debug, Clone, Deserialize)]
pub struct BranchDescriptor {
    pub id: String,
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    #[serde(flatten)]
    pub credentials: BranchCredentials,
    pub category: Category,
}

fn default_port() -> u16 {
    5432
}

impl BranchDescriptor {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject descriptors that cannot possibly be connected to
    pub fn validate(&self) -> Result<(), BranchError> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.port == 0 {
            missing.push("port");
        }
        if self.database.trim().is_empty() {
            missing.push("database");
        }
        if self.credentials.username.trim().is_empty() {
            missing.push("username");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BranchError::IncompleteDescriptor(format!(
                "branch {} is missing {}",
                self.id,
                missing.join(", ")
            )))
        }
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
