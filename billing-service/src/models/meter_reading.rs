//! Meter reading model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One previous/current counter snapshot pair per utility for a contract.
///
/// Counters are non-negative and non-decreasing by convention only; the
/// mechanic enters them by hand and meter swaps do happen, so the billing
/// engine clamps rather than rejects backwards movement.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MeterReading {
    pub reading_id: Uuid,
    pub contract_id: Uuid,
    pub reading_date: NaiveDate,
    pub prev_water: Decimal,
    pub current_water: Decimal,
    pub prev_electricity: Decimal,
    pub current_electricity: Decimal,
    pub created_utc: DateTime<Utc>,
}
