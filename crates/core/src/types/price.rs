//! Type-safe price representation using decimal arithmetic.

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
    /// The input is not a decimal number.
    #[error("price must be a number: {0}")]
    Invalid(String),
    /// More than two decimal places.
    #[error("price cannot have more than 2 decimal places")]
    TooPrecise,
    /// Above [`Price::MAX`].
    #[error("price cannot exceed {}", Price::MAX)]
    TooLarge,
}

/// A non-negative unit price in the store currency's standard unit
/// (naira, not kobo).
///
/// Zero is a valid price. Prices carry at most two decimal places and are
/// capped at [`Price::MAX`], the largest value the catalog column holds.
///
/// ```
/// use sparktizen_core::Price;
///
/// let price = Price::parse("1500").unwrap();
/// assert_eq!(price.to_string(), "1500.00");
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("19.999").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted price, `9999999999.99` (`NUMERIC(12, 2)`).
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_327, 232, 0, false, 2));

    /// Create a price from a decimal amount.
    ///
    /// Trailing zeros do not count as precision: `19.990` is accepted.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero,
    /// `PriceError::TooPrecise` past two decimal places, and
    /// `PriceError::TooLarge` above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// Parse a price from user input such as `"2000"` or `" 19.99 "`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` for non-numeric input and
    /// `PriceError::Negative` for amounts below zero.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity, producing a line total.
    ///
    /// Saturates at `Decimal::MAX`. Within [`Price::MAX`] and `u32`
    /// quantities the product is always exact.
    #[must_use]
    pub fn times(self, quantity: u32) -> Decimal {
        self.0
            .checked_mul(Decimal::from(quantity))
            .unwrap_or(Decimal::MAX)
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

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.0))
    }
}

/// Render an amount with exactly two decimal places, rounding half away
/// from zero (`2000` → `"2000.00"`, `19.999` → `"20.00"`).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded =
        amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// ISO 4217 currency codes the store can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    NGN,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol used in order messages and price labels.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NGN => "₦",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NGN => "NGN",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Format an amount with this currency's symbol, e.g. `₦2500.00`.
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        format!("{}{}", self.symbol(), format_amount(amount))
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NGN" => Ok(Self::NGN),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_valid() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
    }

    #[test]
    fn test_invalid_rejected() {
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
        assert!(matches!(Price::parse(""), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_precision_and_range() {
        assert_eq!(Price::parse("19.999"), Err(PriceError::TooPrecise));
        assert_eq!(Price::parse("19.990").unwrap().to_string(), "19.99");
        assert_eq!(Price::MAX.to_string(), "9999999999.99");
        assert_eq!(Price::parse("9999999999.99").unwrap(), Price::MAX);
        assert_eq!(Price::parse("10000000000"), Err(PriceError::TooLarge));
        assert_eq!(
            Price::parse("79228162514264337593543950335"),
            Err(PriceError::TooLarge)
        );
        assert!(serde_json::from_str::<Price>("1e20").is_err());
    }

    #[test]
    fn test_times_at_bounds() {
        let expected = Decimal::from_str("9999999999.99").unwrap() * Decimal::from(u32::MAX);
        assert_eq!(Price::MAX.times(u32::MAX), expected);
        assert_eq!(Price::ZERO.times(u32::MAX), Decimal::ZERO);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from(2000)), "2000.00");
        assert_eq!(format_amount(Decimal::new(1999, 2)), "19.99");
        assert_eq!(format_amount(Decimal::new(5, 1)), "0.50");
        assert_eq!(format_amount(Decimal::new(19_995, 3)), "20.00");
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(CurrencyCode::NGN.format(Decimal::from(2500)), "₦2500.00");
        assert_eq!(CurrencyCode::USD.format(Decimal::new(150, 2)), "$1.50");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("ngn".parse::<CurrencyCode>().unwrap(), CurrencyCode::NGN);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_times() {
        assert_eq!(Price::from_units(1000).times(2), Decimal::from(2000));
    }

    #[test]
    fn test_serde_accepts_numbers_and_rejects_negative() {
        let price: Price = serde_json::from_str("1500").unwrap();
        assert_eq!(price, Price::from_units(1500));
        assert!(serde_json::from_str::<Price>("-3").is_err());
    }
}
