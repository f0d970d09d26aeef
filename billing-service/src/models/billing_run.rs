//! Billing run audit models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Billing run type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingRunType {
    Scheduled,
    Manual,
}

impl BillingRunType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingRunType::Scheduled => "scheduled",
            BillingRunType::Manual => "manual",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "manual" => BillingRunType::Manual,
            _ => BillingRunType::Scheduled,
        }
    }
}

/// Billing run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingRunStatus {
    Running,
    Completed,
    Failed,
}

impl BillingRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingRunStatus::Running => "running",
            BillingRunStatus::Completed => "completed",
            BillingRunStatus::Failed => "failed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "completed" => BillingRunStatus::Completed,
            "failed" => BillingRunStatus::Failed,
            _ => BillingRunStatus::Running,
        }
    }
}

/// Per-contract outcome within one billing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Generated,
    SkippedNoReading,
    SkippedAlreadyBilled,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Generated => "generated",
            RunOutcome::SkippedNoReading => "skipped_no_reading",
            RunOutcome::SkippedAlreadyBilled => "skipped_already_billed",
            RunOutcome::Failed => "failed",
        }
    }
}

/// Billing run row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BillingRun {
    pub run_id: Uuid,
    pub run_type: String,
    pub status: String,
    pub started_utc: DateTime<Utc>,
    pub completed_utc: Option<DateTime<Utc>>,
    pub contracts_processed: i32,
    pub invoices_generated: i32,
    pub contracts_skipped: i32,
    pub contracts_failed: i32,
    pub error_message: Option<String>,
}

/// Per-contract result row for a billing run.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BillingRunResult {
    pub result_id: Uuid,
    pub run_id: Uuid,
    pub contract_id: Uuid,
    pub outcome: String,
    pub invoice_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub created_utc: DateTime<Utc>,
}
