//! Invoice model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    /// Produced by the monthly billing run.
    Monthly,
    /// Raised by a manager outside the run (repairs, deposits).
    Manual,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Monthly => "monthly",
            InvoiceType::Manual => "manual",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "manual" => InvoiceType::Manual,
            _ => InvoiceType::Monthly,
        }
    }
}

/// Invoice status. The run creates invoices as `Unpaid`; the transitions
/// to `Pending` and `Paid` belong to the payment flows, not this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "pending" => InvoiceStatus::Pending,
            "paid" => InvoiceStatus::Paid,
            _ => InvoiceStatus::Unpaid,
        }
    }
}

/// Invoice row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub contract_id: Uuid,
    pub invoice_type: String,
    pub status: String,
    pub room_rent_cost: Decimal,
    pub room_elec_cost: Decimal,
    pub room_water_cost: Decimal,
    pub room_repair_cost: Decimal,
    pub room_deposit_cost: Decimal,
    pub room_total_cost: Decimal,
    pub billing_period: String,
    pub bill_date: NaiveDate,
    pub due_date: NaiveDate,
    pub created_utc: DateTime<Utc>,
}

/// Input for inserting an invoice. Fully composed before any I/O happens;
/// the run either persists the whole record or none of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub contract_id: Uuid,
    pub invoice_type: InvoiceType,
    pub status: InvoiceStatus,
    pub room_rent_cost: Decimal,
    pub room_elec_cost: Decimal,
    pub room_water_cost: Decimal,
    pub room_repair_cost: Decimal,
    pub room_deposit_cost: Decimal,
    pub room_total_cost: Decimal,
    pub billing_period: String,
    pub bill_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// The billing period an invoice dated `date` belongs to, `YYYY-MM`.
/// Together with the contract id this is the run's idempotency key.
pub fn billing_period_for(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_period_formats_year_month() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(billing_period_for(date), "2025-03");
    }

    #[test]
    fn invoice_enums_round_trip() {
        assert_eq!(
            InvoiceStatus::from_string(InvoiceStatus::Unpaid.as_str()),
            InvoiceStatus::Unpaid
        );
        assert_eq!(
            InvoiceType::from_string(InvoiceType::Monthly.as_str()),
            InvoiceType::Monthly
        );
        assert_eq!(
            InvoiceType::from_string(InvoiceType::Manual.as_str()),
            InvoiceType::Manual
        );
    }
}
