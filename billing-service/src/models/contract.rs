//! Contract model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Contract status, one canonical casing.
///
/// The legacy data this system inherited stored mixed-case status strings
/// (`"Active"`, `"active"`, `"Complete"`, ...); normalization happens once
/// here, at the store boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Complete,
    Incomplete,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Complete => "complete",
            ContractStatus::Incomplete => "incomplete",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => ContractStatus::Active,
            "complete" => ContractStatus::Complete,
            _ => ContractStatus::Incomplete,
        }
    }

    /// Whether a contract in this status is billed in the monthly run.
    /// `complete` means the paperwork is done and the tenant is in the
    /// room, so it bills the same as `active`.
    pub fn is_billable(&self) -> bool {
        matches!(self, ContractStatus::Active | ContractStatus::Complete)
    }
}

/// How water is billed for one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterPricing {
    /// Billed from the meter delta at the per-unit rate.
    Metered,
    /// Flat monthly fee; `None` falls back to the configured default.
    Fixed(Option<Decimal>),
}

impl WaterPricing {
    /// Normalize the legacy column pair. `"unit"`, unset, and unknown
    /// values all mean metered billing; absence of configuration is not
    /// an error.
    pub fn from_columns(pricing: &str, fixed_price: Option<Decimal>) -> Self {
        match pricing.trim().to_ascii_lowercase().as_str() {
            "fixed" => WaterPricing::Fixed(fixed_price),
            _ => WaterPricing::Metered,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WaterPricing::Metered => "metered",
            WaterPricing::Fixed(_) => "fixed",
        }
    }
}

/// A contract eligible for monthly billing, with its room joined in for
/// the rent price.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BillableContract {
    pub contract_id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub water_pricing: String,
    pub water_fixed_price: Option<Decimal>,
    pub room_number: String,
    pub rent_price: Option<Decimal>,
}

impl BillableContract {
    pub fn status(&self) -> ContractStatus {
        ContractStatus::from_string(&self.status)
    }

    pub fn water(&self) -> WaterPricing {
        WaterPricing::from_columns(&self.water_pricing, self.water_fixed_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_normalizes_legacy_casings() {
        assert_eq!(ContractStatus::from_string("active"), ContractStatus::Active);
        assert_eq!(ContractStatus::from_string("Active"), ContractStatus::Active);
        assert_eq!(ContractStatus::from_string("ACTIVE"), ContractStatus::Active);
        assert_eq!(
            ContractStatus::from_string("Complete"),
            ContractStatus::Complete
        );
        assert_eq!(
            ContractStatus::from_string(" complete "),
            ContractStatus::Complete
        );
    }

    #[test]
    fn unknown_status_is_incomplete() {
        assert_eq!(
            ContractStatus::from_string("cancelled"),
            ContractStatus::Incomplete
        );
        assert_eq!(ContractStatus::from_string(""), ContractStatus::Incomplete);
    }

    #[test]
    fn billable_statuses() {
        assert!(ContractStatus::Active.is_billable());
        assert!(ContractStatus::Complete.is_billable());
        assert!(!ContractStatus::Incomplete.is_billable());
    }

    #[test]
    fn water_pricing_from_legacy_columns() {
        let seventy_five = Decimal::from(75);
        assert_eq!(
            WaterPricing::from_columns("fixed", Some(seventy_five)),
            WaterPricing::Fixed(Some(seventy_five))
        );
        assert_eq!(
            WaterPricing::from_columns("fixed", None),
            WaterPricing::Fixed(None)
        );
        assert_eq!(WaterPricing::from_columns("unit", None), WaterPricing::Metered);
        assert_eq!(WaterPricing::from_columns("", None), WaterPricing::Metered);
        assert_eq!(
            WaterPricing::from_columns("whatever", Some(seventy_five)),
            WaterPricing::Metered
        );
    }
}
