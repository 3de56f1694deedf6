//! Non-negative quantities of stock.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use teeforge_core::{DomainError, DomainResult, ValueObject};

/// A non-negative amount of an inventory item, in the item's unit.
///
/// Decimal so fractional units ("2.5 yards") are exact. Construction
/// rejects negatives, including through deserialization.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// Validate and wrap a raw amount. `what` names the field in the error.
    pub fn parse(value: Decimal, what: &str) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation(format!(
                "{what} cannot be negative (got {value})"
            )));
        }
        Ok(Self(value.normalize()))
    }

    pub fn new(value: Decimal) -> DomainResult<Self> {
        Self::parse(value, "quantity")
    }

    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Quantity) -> DomainResult<Quantity> {
        self.0
            .checked_add(rhs.0)
            .map(Quantity)
            .ok_or_else(|| DomainError::invariant("quantity overflow"))
    }

    /// `self - rhs`, floored at zero.
    pub fn saturating_sub(self, rhs: Quantity) -> Quantity {
        if rhs.0 >= self.0 {
            Quantity::ZERO
        } else {
            Quantity(self.0 - rhs.0)
        }
    }
}

impl ValueObject for Quantity {}

impl TryFrom<Decimal> for Quantity {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Quantity::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_are_rejected() {
        let err = Quantity::parse(Decimal::new(-5, 1), "stock").unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("stock")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let three = Quantity::from_units(3);
        let five = Quantity::from_units(5);
        assert_eq!(five.saturating_sub(three), Quantity::from_units(2));
        assert_eq!(three.saturating_sub(five), Quantity::ZERO);
    }

    #[test]
    fn deserialization_validates_sign() {
        let ok: Quantity = serde_json::from_str("\"2.50\"").unwrap();
        assert_eq!(ok.value(), Decimal::new(25, 1));
        assert!(serde_json::from_str::<Quantity>("\"-1\"").is_err());
    }
}
