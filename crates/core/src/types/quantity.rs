//! Basket line quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative.
    #[error("quantity must be at least 1")]
    NotPositive,
    /// Does not fit a 32-bit column.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: i32,
    },
}

/// A strictly positive number of units on a basket line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(1);

    /// Largest quantity a basket line can hold.
    pub const MAX: Self = Self(i32::MAX);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for zero or negative values.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive);
        }
        Ok(Self(value))
    }

    /// The underlying number of units.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

/// What an in-place basket edit asks for.
///
/// Any requested value of zero or below removes the line instead of
/// storing a non-positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// Store this quantity on the line.
    Set(Quantity),
    /// Delete the line.
    Remove,
}

impl QuantityUpdate {
    /// Interpret a quantity taken from a request path.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] when the value exceeds `i32::MAX`.
    pub fn from_requested(requested: i64) -> Result<Self, QuantityError> {
        if requested <= 0 {
            return Ok(Self::Remove);
        }
        let value = i32::try_from(requested).map_err(|_| QuantityError::TooLarge { max: i32::MAX })?;
        Quantity::new(value).map(Self::Set)
    }
}
