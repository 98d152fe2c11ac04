//! Product price backed by decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(8, 2)`, so a valid price is non-negative,
//! has at most two fractional digits and stays below one million.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit the storage column.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
    /// More than two fractional digits.
    #[error("price can have at most 2 decimal places")]
    TooPrecise,
    /// The input is not a number.
    #[error("price is not a valid number")]
    Invalid,
}

/// A non-negative product price in the shop currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Maximum number of fractional digits.
    pub const SCALE: u32 = 2;

    /// Exclusive upper bound for `NUMERIC(8, 2)`.
    #[must_use]
    pub fn max() -> Decimal {
        Decimal::new(1_000_000, 0)
    }

    /// Create a price from a decimal amount.
    ///
    /// Trailing zeros past the second decimal place are accepted
    /// (`1.500` is `1.50`).
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, too large, or has more
    /// than two significant fractional digits.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount >= Self::max() {
            return Err(PriceError::TooLarge { max: Self::max() });
        }
        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise);
        }
        let mut amount = normalized;
        amount.rescale(Self::SCALE);
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or too large.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, Self::SCALE))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The cost of `quantity` units at this price.
    #[must_use]
    pub fn times(&self, quantity: i32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid)?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // The column is NUMERIC(8,2) with a CHECK (price >= 0)
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prices() {
        assert_eq!("0".parse::<Price>().unwrap(), Price::ZERO);
        assert_eq!("12.5".parse::<Price>().unwrap().to_string(), "12.50");
        assert_eq!(" 3.99 ".parse::<Price>().unwrap().to_string(), "3.99");
        assert_eq!("1.500".parse::<Price>().unwrap().to_string(), "1.50");
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!("-0.01".parse::<Price>(), Err(PriceError::Negative));
    }

    #[test]
    fn test_too_precise_rejected() {
        assert_eq!("1.999".parse::<Price>(), Err(PriceError::TooPrecise));
    }

    #[test]
    fn test_too_large_rejected() {
        assert!(matches!(
            "1000000".parse::<Price>(),
            Err(PriceError::TooLarge { .. })
        ));
        assert!("999999.99".parse::<Price>().is_ok());
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!("abc".parse::<Price>(), Err(PriceError::Invalid));
    }

    #[test]
    fn test_times() {
        let price = Price::from_cents(250).unwrap();
        assert_eq!(price.times(3), Decimal::new(750, 2));
    }

    #[test]
    fn test_deserialize_validates() {
        let price: Price = serde_json::from_str("\"4.20\"").unwrap();
        assert_eq!(price.to_string(), "4.20");
        assert!(serde_json::from_str::<Price>("\"-1\"").is_err());
    }
}
