use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, DateRange};

// ============================================================================
// Dashboard Types
// ============================================================================

/// Body of the financial dashboard request. Dates are optional at the serde
/// level so a missing one is answered with a 400 and a readable message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl DashboardRequest {
    pub fn range(&self) -> std::result::Result<DateRange, String> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Ok(DateRange::new(start, end)),
            (None, None) => Err("start_date and end_date are required".to_string()),
            (None, _) => Err("start_date is required".to_string()),
            (_, None) => Err("end_date is required".to_string()),
        }
    }
}

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LivenessResponse {
    pub status: String,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
