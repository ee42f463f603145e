//! Exact money and rate arithmetic.
//!
//! Amounts are held in cents and rates in parts-per-million so commission
//! math never touches floating point. Floats only appear at the serde edge,
//! where external data hands us `1000` or `0.015`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::constants::{CENTS_PER_UNIT, RATE_SCALE};
use crate::error::ReferralError;

/// Slack for binary float noise, e.g. `0.015 * 1e6 = 15000.000000000002`.
const PPM_TOLERANCE: f64 = 1e-6;

/// A non-negative amount of money in minor units (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    /// Whole currency units, e.g. `Money::from_units(1000)` is `1000.00`.
    pub const fn from_units(units: u64) -> Self {
        Money(units.saturating_mul(CENTS_PER_UNIT))
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }
}

impl TryFrom<f64> for Money {
    type Error = ReferralError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(ReferralError::InvalidAmount(format!(
                "{} is not a non-negative finite amount",
                value
            )));
        }
        let cents = (value * CENTS_PER_UNIT as f64).round();
        if cents > u64::MAX as f64 {
            return Err(ReferralError::InvalidAmount(format!("{} is too large", value)));
        }
        Ok(Money(cents as u64))
    }
}

impl From<Money> for f64 {
    fn from(m: Money) -> f64 {
        m.as_f64()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / CENTS_PER_UNIT, self.0 % CENTS_PER_UNIT)
    }
}

/// A commission rate: a fraction in `[0, 1]` held as parts-per-million.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rate(u32);

impl Rate {
    pub const ZERO: Rate = Rate(0);

    /// Saturates at `1_000_000` (a rate of 1).
    pub const fn from_ppm(ppm: u32) -> Self {
        if ppm as u64 > RATE_SCALE {
            Rate(RATE_SCALE as u32)
        } else {
            Rate(ppm)
        }
    }

    pub const fn ppm(self) -> u32 {
        self.0
    }

    pub fn from_fraction(fraction: f64) -> Result<Self, ReferralError> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(ReferralError::InvalidRate(format!(
                "{} is not a fraction between 0 and 1",
                fraction
            )));
        }
        let scaled = fraction * RATE_SCALE as f64;
        let ppm = scaled.round();
        if (scaled - ppm).abs() > PPM_TOLERANCE {
            return Err(ReferralError::InvalidRate(format!(
                "{} is not representable in ppm",
                fraction
            )));
        }
        Ok(Rate(ppm as u32))
    }

    pub fn as_fraction(self) -> f64 {
        self.0 as f64 / RATE_SCALE as f64
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `round(amount * rate)` to the cent, half away from zero.
    pub fn apply(self, amount: Money) -> Money {
        let scale = RATE_SCALE as u128;
        let scaled = amount.cents() as u128 * self.0 as u128;
        let cents = (scaled + scale / 2) / scale;
        Money::from_cents(u64::try_from(cents).unwrap_or(u64::MAX))
    }
}

impl TryFrom<f64> for Rate {
    type Error = ReferralError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rate::from_fraction(value)
    }
}

impl From<Rate> for f64 {
    fn from(r: Rate) -> f64 {
        r.as_fraction()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // hundredths of a percent
        let bp = self.0.saturating_add(50) / 100;
        write!(f, "{}.{:02}%", bp / 100, bp % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_apply_standard_levels() {
        let sale = Money::from_units(1000);
        assert_eq!(Rate::from_fraction(0.02).unwrap().apply(sale), Money::from_cents(2000));
        assert_eq!(Rate::from_fraction(0.015).unwrap().apply(sale), Money::from_cents(1500));
        assert_eq!(Rate::from_fraction(0.003).unwrap().apply(sale), Money::from_cents(300));
        assert_eq!(Rate::ZERO.apply(sale), Money::ZERO);
    }

    #[test]
    fn test_rate_apply_rounds_half_up() {
        // 0.25 * 0.5 = 0.125 -> 0.13
        let half = Rate::from_fraction(0.5).unwrap();
        assert_eq!(half.apply(Money::from_cents(25)), Money::from_cents(13));
        // 0.33 * 0.5 = 0.165 -> 0.17
        assert_eq!(half.apply(Money::from_cents(33)), Money::from_cents(17));
        // 12.34 * 0.002 = 0.02468 -> 0.02
        let r = Rate::from_fraction(0.002).unwrap();
        assert_eq!(r.apply(Money::from_cents(1234)), Money::from_cents(2));
    }

    #[test]
    fn test_money_parse_and_display() {
        let m = Money::try_from(1200.0).unwrap();
        assert_eq!(m.cents(), 120_000);
        assert_eq!(m.to_string(), "1200.00");
        assert_eq!(Money::try_from(12.5).unwrap().to_string(), "12.50");
        assert!(Money::try_from(-1.0).is_err());
        assert!(Money::try_from(f64::NAN).is_err());
    }

    #[test]
    fn test_money_sum_saturates() {
        let total: Money = [Money::from_cents(150), Money::from_cents(250)].iter().sum();
        assert_eq!(total, Money::from_cents(400));
        assert_eq!(Money::from_cents(u64::MAX) + Money::from_cents(1), Money::from_cents(u64::MAX));
    }

    #[test]
    fn test_rate_bounds_and_display() {
        assert!(Rate::from_fraction(-0.01).is_err());
        assert!(Rate::from_fraction(1.5).is_err());
        assert_eq!(Rate::from_fraction(0.015).unwrap().ppm(), 15_000);
        assert_eq!(Rate::from_fraction(0.015).unwrap().to_string(), "1.50%");
        assert_eq!(Rate::from_fraction(0.002).unwrap().to_string(), "0.20%");
    }

    #[test]
    fn test_serde_json_edges() {
        let m: Money = serde_json::from_str("1000").unwrap();
        assert_eq!(m, Money::from_units(1000));
        assert_eq!(serde_json::to_string(&Money::from_cents(2450)).unwrap(), "24.5");
        let r: Rate = serde_json::from_str("0.005").unwrap();
        assert_eq!(r.ppm(), 5_000);
        assert!(serde_json::from_str::<Rate>("-0.5").is_err());
    }

    #[test]
    fn test_sub_ppm_rates_are_rejected() {
        assert!(matches!(
            Rate::from_fraction(0.0000004),
            Err(ReferralError::InvalidRate(_))
        ));
        assert!(Rate::from_fraction(0.0123456789).is_err());
        assert!(serde_json::from_str::<Rate>("0.0000004").is_err());
        // exactly one ppm is fine
        assert_eq!(Rate::from_fraction(0.000001).unwrap().ppm(), 1);
        assert_eq!(Rate::from_fraction(1.0).unwrap().ppm(), 1_000_000);
    }

    #[test]
    fn test_from_ppm_saturates_at_one() {
        let r = Rate::from_ppm(3_000_000);
        assert_eq!(r.ppm(), 1_000_000);
        let big = Money::from_cents(u64::MAX);
        assert_eq!(r.apply(big), big);
        assert_eq!(Rate::from_ppm(u32::MAX).apply(Money::from_cents(700)), Money::from_cents(700));
    }
}
