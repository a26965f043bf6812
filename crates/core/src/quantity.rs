//! Fixed-point quantities.
//!
//! Stock deltas and BOM scaling drive real inventory decrements, so they use
//! `rust_decimal::Decimal` rather than floating point: `20 * 50 / 100` must
//! come out exact, and error must not accumulate across many lines.

use core::ops::{Add, AddAssign, Neg, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A signed, exact quantity in some unit of measure.
///
/// Negative values are legal: outflow movements carry negative deltas and the
/// ledger allows on-hand stock to go negative (it records truth, it does not
/// enforce feasibility).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// A quantity required to be strictly positive (planned/produced amounts,
    /// BOM batch sizes and line quantities).
    pub fn positive(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "quantity must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// A quantity required to be nonzero (movement deltas).
    pub fn nonzero(value: Decimal) -> DomainResult<Self> {
        if value == Decimal::ZERO {
            return Err(DomainError::validation("quantity must be nonzero"));
        }
        Ok(Self(value))
    }

    pub fn from_i64(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Magnitude of the quantity (used when comparing consumption against
    /// resolver output, where movements carry negative deltas).
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 - rhs.0)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity(-self.0)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(Quantity::positive(dec!(0)).is_err());
        assert!(Quantity::positive(dec!(-1.5)).is_err());
        assert!(Quantity::positive(dec!(0.001)).is_ok());
    }

    #[test]
    fn nonzero_allows_negative() {
        assert!(Quantity::nonzero(dec!(-10)).is_ok());
        assert!(Quantity::nonzero(dec!(0)).is_err());
    }

    #[test]
    fn arithmetic_is_exact() {
        let a = Quantity::new(dec!(0.1));
        let b = Quantity::new(dec!(0.2));
        assert_eq!((a + b).value(), dec!(0.3));
        assert_eq!((-a).value(), dec!(-0.1));
        assert_eq!((a - b).abs().value(), dec!(0.1));
    }
}
