//! Money amounts in minor currency units.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Amount in kopecks (1/100 RUB). Storefront prices are always non-negative.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub fn minor(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    pub fn checked_mul(self, quantity: u32) -> DomainResult<Money> {
        self.0
            .checked_mul(u64::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    /// Decimal string with two fraction digits (`"1500.00"`), as payment
    /// providers expect it.
    pub fn to_decimal_string(self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} RUB", self.to_decimal_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_string_pads_kopecks() {
        assert_eq!(Money::from_minor(150_005).to_decimal_string(), "1500.05");
        assert_eq!(Money::ZERO.to_string(), "0.00 RUB");
    }

    #[test]
    fn overflow_is_a_validation_error() {
        let err = Money::from_minor(u64::MAX).checked_mul(2).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(Money::from_minor(u64::MAX).checked_add(Money::from_minor(1)).is_err());
    }
}
