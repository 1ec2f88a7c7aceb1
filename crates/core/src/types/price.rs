//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog serves prices as bare JSON numbers (`179.9`), occasionally as
//! strings (`"179.90"`). Both are accepted; prices are written back as
//! numbers so persisted carts keep the catalog's shape.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A product price in the store's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_accepts_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("179.9").unwrap();
        let from_string: Price = serde_json::from_str("\"179.90\"").unwrap();
        assert_eq!(from_number, Price::from_cents(17990));
        assert_eq!(from_string, Price::from_cents(17990));
    }

    #[test]
    fn test_price_deserializes_inside_records() {
        let prices: Vec<Price> = serde_json::from_str(r#"[139.9, "219.90", 0]"#).unwrap();
        assert_eq!(
            prices,
            vec![Price::from_cents(13990), Price::from_cents(21990), Price::ZERO]
        );
        assert!(serde_json::from_str::<Price>("\"cheap\"").is_err());
    }

    #[test]
    fn test_price_serializes_as_number() {
        let json = serde_json::to_string(&Price::from_cents(13990)).unwrap();
        assert_eq!(json, "139.9");
    }

    #[test]
    fn test_price_display_has_two_decimals() {
        assert_eq!(Price::from_cents(17990).to_string(), "179.90");
        assert_eq!(Price::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_price_times_and_sum() {
        let total: Price = [Price::from_cents(1050).times(2), Price::from_cents(99)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(2199));
    }
}
