//! The billing engine: rate table, meter delta and water pricing
//! calculations, invoice composition, and the monthly run coordinator.
//!
//! Everything here except the coordinator is pure computation; the
//! coordinator talks to the data store only through [`BillingStore`].

mod composer;
mod coordinator;
mod meter;
mod rates;
mod water;

pub use composer::compose_invoice;
pub use coordinator::{run_monthly_billing, BillingRunReport, BillingStore, RunFailure};
pub use meter::UtilityUsage;
pub use rates::RateTable;
pub use water::{resolve_water_charge, WaterCharge};

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a money amount to two decimal places, half away from zero.
pub(crate) fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_half_up() {
        assert_eq!(round2("1.005".parse().unwrap()), "1.01".parse().unwrap());
        assert_eq!(round2("1.004".parse().unwrap()), "1.00".parse().unwrap());
        assert_eq!(round2(Decimal::from(5430)), Decimal::from(5430));
    }
}
