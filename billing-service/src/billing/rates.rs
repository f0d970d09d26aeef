//! Utility rate table.

use crate::config::RatesConfig;
use rust_decimal::Decimal;

/// Flat utility tariffs in THB. These are deployment configuration, not
/// data: the same rates apply to every room in every branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    /// THB per electricity unit (kWh).
    pub electricity_per_unit: Decimal,
    /// THB per water unit, for metered contracts.
    pub water_per_unit: Decimal,
    /// Flat monthly water fee for fixed-price contracts that never had a
    /// price negotiated.
    pub water_fixed_default: Decimal,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            electricity_per_unit: Decimal::from(5),
            water_per_unit: Decimal::from(18),
            water_fixed_default: Decimal::from(100),
        }
    }
}

impl From<&RatesConfig> for RateTable {
    fn from(config: &RatesConfig) -> Self {
        Self {
            electricity_per_unit: config.electricity_per_unit,
            water_per_unit: config.water_per_unit,
            water_fixed_default: config.water_fixed_default,
        }
    }
}
