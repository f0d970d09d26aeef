//! Water pricing resolution.

use super::meter::UtilityUsage;
use super::rates::RateTable;
use crate::models::{MeterReading, WaterPricing};
use rust_decimal::Decimal;

/// Resolved water charge for one contract-month. `usage` is reported only
/// for metered contracts; a fixed fee has no meaningful usage figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterCharge {
    pub usage: Option<Decimal>,
    pub cost: Decimal,
}

/// Pick between metered and fixed-price water billing.
pub fn resolve_water_charge(
    pricing: WaterPricing,
    reading: &MeterReading,
    rates: &RateTable,
) -> WaterCharge {
    match pricing {
        WaterPricing::Fixed(Some(price)) => WaterCharge {
            usage: None,
            cost: price,
        },
        WaterPricing::Fixed(None) => WaterCharge {
            usage: None,
            cost: rates.water_fixed_default,
        },
        WaterPricing::Metered => {
            let metered = UtilityUsage::from_pair(
                reading.prev_water,
                reading.current_water,
                rates.water_per_unit,
            );
            WaterCharge {
                usage: Some(metered.usage),
                cost: metered.cost,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn reading(prev_water: i64, current_water: i64) -> MeterReading {
        MeterReading {
            reading_id: Uuid::new_v4(),
            contract_id: Uuid::new_v4(),
            reading_date: NaiveDate::from_ymd_opt(2025, 6, 28).unwrap(),
            prev_water: Decimal::from(prev_water),
            current_water: Decimal::from(current_water),
            prev_electricity: Decimal::ZERO,
            current_electricity: Decimal::ZERO,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn metered_water_uses_the_delta() {
        let charge = resolve_water_charge(
            WaterPricing::Metered,
            &reading(100, 110),
            &RateTable::default(),
        );
        assert_eq!(charge.usage, Some(Decimal::from(10)));
        assert_eq!(charge.cost, Decimal::from(180));
    }

    #[test]
    fn fixed_price_ignores_the_meter() {
        let charge = resolve_water_charge(
            WaterPricing::Fixed(Some(Decimal::from(75))),
            &reading(100, 9999),
            &RateTable::default(),
        );
        assert_eq!(charge.usage, None);
        assert_eq!(charge.cost, Decimal::from(75));
    }

    #[test]
    fn fixed_without_price_falls_back_to_default() {
        let charge = resolve_water_charge(
            WaterPricing::Fixed(None),
            &reading(100, 110),
            &RateTable::default(),
        );
        assert_eq!(charge.usage, None);
        assert_eq!(charge.cost, Decimal::from(100));
    }
}
