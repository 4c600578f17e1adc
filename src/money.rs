//! Fixed-point money type with 2 decimal places precision.
//!
//! Uses `rust_decimal` internally with scale enforcement so that sums of
//! sale totals and payment amounts never pick up floating-point error.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// A monetary amount that maintains exactly 2 decimal places.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use sales_balance::Money;
///
/// let amount = Money::from_str("10.5").unwrap();
/// assert_eq!(amount.to_string(), "10.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Largest magnitude, in whole units, accepted when parsing.
    ///
    /// Sums over any realistic number of parsed amounts stay far inside the
    /// `Decimal` range, so the arithmetic operators cannot overflow on
    /// snapshot data.
    pub const MAX_UNITS: i64 = 1_000_000_000_000_000;

    /// Creates a new `Money` from a `Decimal`, normalizing to 2 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value;
        normalized.rescale(Self::SCALE);
        Money(normalized)
    }

    /// Creates an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, Self::SCALE))
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns `true` if this value is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Like [`Money::new`], but rejects values beyond [`Money::MAX_UNITS`].
    pub fn bounded(value: Decimal) -> std::result::Result<Self, rust_decimal::Error> {
        if value.abs() > Decimal::from(Self::MAX_UNITS) {
            return Err(rust_decimal::Error::ErrorString(format!(
                "amount {} is outside the supported range",
                value
            )));
        }
        Ok(Money::new(value))
    }

    /// Multiplies a unit price by a quantity.
    pub fn times(self, quantity: u32) -> Self {
        Money::new(self.0 * Decimal::from(quantity))
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())?;
        Money::bounded(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
        self.0.rescale(Self::SCALE);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
        self.0.rescale(Self::SCALE);
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

/// The backend emits amounts as JSON numbers; files written by this crate
/// carry them as strings. Both are accepted.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a number or string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Money, E> {
        Money::from_str(v).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Money, E> {
        let decimal = Decimal::from_f64(v)
            .ok_or_else(|| E::custom(format!("amount {} is not representable", v)))?;
        Money::bounded(decimal).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Money, E> {
        Money::bounded(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Money, E> {
        Money::bounded(Decimal::from(v)).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_normalizes_scale() {
        assert_eq!(Money::from_str("1").unwrap().to_string(), "1.00");
        assert_eq!(Money::from_str("1.5").unwrap().to_string(), "1.50");
        assert_eq!(Money::from_str("  2.25  ").unwrap().to_string(), "2.25");
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!(Money::from_str("abc").is_err());
        assert!(Money::from_str("").is_err());
    }

    #[test]
    fn test_arithmetic_preserves_scale() {
        let a = Money::from_str("1.5").unwrap();
        let b = Money::from_str("2.5").unwrap();

        assert_eq!((a + b).to_string(), "4.00");
        assert_eq!((a - b).to_string(), "-1.00");
        assert_eq!((-a).to_string(), "-1.50");
    }

    #[test]
    fn test_sum_and_times() {
        let amounts = [Money::from_cents(1050), Money::from_cents(250)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, Money::from_cents(1300));
        assert_eq!(Money::from_cents(1250).times(3).to_string(), "37.50");
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_float: Money = serde_json::from_str("120.5").unwrap();
        let from_int: Money = serde_json::from_str("40").unwrap();
        let from_str: Money = serde_json::from_str("\"19.99\"").unwrap();

        assert_eq!(from_float.to_string(), "120.50");
        assert_eq!(from_int.to_string(), "40.00");
        assert_eq!(from_str.to_string(), "19.99");
    }

    #[test]
    fn test_out_of_range_amounts_rejected() {
        assert!(Money::from_str("70000000000000000000000000000").is_err());
        assert!(Money::from_str("-1000000000000000.01").is_err());
        assert!(serde_json::from_str::<Money>("70000000000000000000000000000").is_err());
        assert!(serde_json::from_str::<Money>("\"70000000000000000000000000000\"").is_err());

        let max = Money::from_str("1000000000000000").unwrap();
        let doubled: Money = [max, max].iter().sum();
        assert_eq!(doubled.to_string(), "2000000000000000.00");
    }

    #[test]
    fn test_serialize_as_two_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(500)).unwrap();
        assert_eq!(json, "\"5.00\"");
    }
}
