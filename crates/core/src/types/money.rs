//! Decimal money types.
//!
//! The backend owns every authoritative total. The client only recomputes a
//! pre-submit estimate for the checkout summary, and that estimate has to use
//! the same two-decimal rounding the backend applies, so the rule lives here
//! in one place.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};
use core::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Display symbol for the site's single currency.
pub const CURRENCY_SYMBOL: &str = "¥";

/// Round to two decimal places, half away from zero.
///
/// ```
/// use folio_core::round2;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round2(Decimal::new(1005, 3)), Decimal::new(101, 2)); // 1.005 -> 1.01
/// assert_eq!(round2(Decimal::new(-1005, 3)), Decimal::new(-101, 2));
/// ```
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A money value as reported by the backend.
///
/// Deserializes from either a JSON number or a decimal string, since the
/// backend is not consistent about which it sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new money value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This value rounded to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self(round2(self.0))
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Format with an explicit sign, e.g. `+¥5.00` or `-¥12.30`.
    #[must_use]
    pub fn signed_display(&self) -> String {
        if self.is_negative() {
            format!("-{}", self.abs())
        } else {
            format!("+{self}")
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CURRENCY_SYMBOL}{:.2}", round2(self.0))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

// Saturates at the `Decimal` bounds; prices come from the backend unchecked.
impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(rhs)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl core::ops::Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

/// Errors that can occur when parsing an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input is not a decimal number.
    #[error("amount must be a number")]
    NotANumber,
    /// The input is not a finite number.
    #[error("amount must be a finite number")]
    NotFinite,
    /// The input is zero or negative.
    #[error("amount must be greater than zero")]
    NotPositive,
}

/// A strictly positive amount entered by the user (top-up, transfer).
///
/// The backend still decides whether the balance covers it; this type only
/// rules out input that can never be valid.
///
/// ```
/// use folio_core::Amount;
///
/// assert!(Amount::parse("12.50").is_ok());
/// assert!(Amount::parse("0").is_err());
/// assert!(Amount::parse("-5").is_err());
/// assert!(Amount::from_f64(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Amount {
    /// Create an amount, rejecting zero and negative values.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::NotPositive`] if `value <= 0`.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }
        Ok(Self(value))
    }

    /// Parse an amount from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a positive decimal number.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.contains("nan") || lowered.contains("inf") {
            return Err(AmountError::NotFinite);
        }
        let value = Decimal::from_str(trimmed).map_err(|_| AmountError::NotANumber)?;
        Self::new(value)
    }

    /// Convert from a float, rejecting NaN and infinities.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or not positive.
    pub fn from_f64(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        let decimal = Decimal::from_f64(value).ok_or(AmountError::NotFinite)?;
        Self::new(decimal)
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// This amount as a money value.
    #[must_use]
    pub const fn as_money(&self) -> Money {
        Money(self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_money())
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec("2.675")), dec("2.68"));
        assert_eq!(round2(dec("2.674")), dec("2.67"));
        assert_eq!(round2(dec("0.125")), dec("0.13"));
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(dec("12.3")).to_string(), "¥12.30");
        assert_eq!(Money::ZERO.to_string(), "¥0.00");
    }

    #[test]
    fn test_money_signed_display() {
        assert_eq!(Money::new(dec("5")).signed_display(), "+¥5.00");
        assert_eq!(Money::new(dec("-12.3")).signed_display(), "-¥12.30");
        assert_eq!(Money::ZERO.signed_display(), "+¥0.00");
    }

    #[test]
    fn test_money_deserializes_number_or_string() {
        let from_number: Money = serde_json::from_str("19.9").unwrap();
        let from_string: Money = serde_json::from_str("\"19.90\"").unwrap();
        assert_eq!(from_number.rounded(), from_string.rounded());
    }

    #[test]
    fn test_money_sum_and_mul() {
        let total: Money = [Money::new(dec("1.10")) * 3, Money::new(dec("0.05")) * 2]
            .into_iter()
            .sum();
        assert_eq!(total.amount(), dec("3.40"));
    }

    #[test]
    fn test_money_arithmetic_saturates() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge + Money::new(Decimal::ONE), huge);
        assert_eq!(huge * 3, huge);
        assert_eq!(Money::new(Decimal::MIN) * 2, Money::new(Decimal::MIN));
        let total: Money = [huge, huge].into_iter().sum();
        assert_eq!(total, huge);
    }

    #[test]
    fn test_amount_rejects_non_positive() {
        assert_eq!(Amount::parse("0"), Err(AmountError::NotPositive));
        assert_eq!(Amount::parse("-5"), Err(AmountError::NotPositive));
        assert_eq!(Amount::parse("abc"), Err(AmountError::NotANumber));
        assert_eq!(Amount::parse("NaN"), Err(AmountError::NotFinite));
        assert_eq!(Amount::from_f64(f64::INFINITY), Err(AmountError::NotFinite));
    }

    #[test]
    fn test_amount_serializes_as_number() {
        let amount = Amount::parse("12.5").unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "12.5");
    }
}
