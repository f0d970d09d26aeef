//! Meter delta calculation.

use rust_decimal::Decimal;

/// Usage and cost derived from one previous/current counter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtilityUsage {
    pub usage: Decimal,
    pub cost: Decimal,
}

impl UtilityUsage {
    /// Usage between two counter snapshots at the given per-unit rate.
    ///
    /// A counter that moved backwards (meter swap, hand-entry error)
    /// clamps to zero usage instead of producing a negative charge.
    /// Callers that care log the anomaly; the calculation itself stays
    /// total.
    pub fn from_pair(prev: Decimal, current: Decimal, rate: Decimal) -> Self {
        let usage = (current - prev).max(Decimal::ZERO);
        Self {
            usage,
            cost: usage * rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_movement_is_exact() {
        let u = UtilityUsage::from_pair(Decimal::from(1000), Decimal::from(1050), Decimal::from(5));
        assert_eq!(u.usage, Decimal::from(50));
        assert_eq!(u.cost, Decimal::from(250));
    }

    #[test]
    fn zero_movement_is_free() {
        let u = UtilityUsage::from_pair(Decimal::from(120), Decimal::from(120), Decimal::from(18));
        assert_eq!(u.usage, Decimal::ZERO);
        assert_eq!(u.cost, Decimal::ZERO);
    }

    #[test]
    fn backwards_movement_clamps_to_zero() {
        let u = UtilityUsage::from_pair(Decimal::from(500), Decimal::from(12), Decimal::from(5));
        assert_eq!(u.usage, Decimal::ZERO);
        assert_eq!(u.cost, Decimal::ZERO);
    }

    #[test]
    fn fractional_counters() {
        let u = UtilityUsage::from_pair(
            "10.5".parse().unwrap(),
            "13.25".parse().unwrap(),
            Decimal::from(18),
        );
        assert_eq!(u.usage, "2.75".parse::<Decimal>().unwrap());
        assert_eq!(u.cost, "49.50".parse::<Decimal>().unwrap());
    }
}
