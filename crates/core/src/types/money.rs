//! Money represented with exact decimal arithmetic.
//!
//! Prices, line subtotals and order totals are `rust_decimal::Decimal`
//! values; nothing on the money path goes through binary floating point.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted by the gallery.
///
/// Every painting is listed and sold in Indian rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "currency_code", rename_all = "UPPERCASE")
)]
pub enum CurrencyCode {
    #[default]
    INR,
}

impl CurrencyCode {
    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INR" => Ok(Self::INR),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

/// An amount together with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// An amount in rupees.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }
}

/// Renders as `"<amount> <code>"`, e.g. `1500.00 INR`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Exact subtotal of `quantity` units at `unit_price`.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_line_total_is_exact() {
        assert_eq!(line_total(dec("299.99"), 3), dec("899.97"));
        assert_eq!(line_total(dec("0.10"), 3), dec("0.30"));
    }

    #[test]
    fn test_summing_line_totals_has_no_drift() {
        let total: Decimal = (0..10).map(|_| line_total(dec("0.10"), 1)).sum();
        assert_eq!(total, dec("1.00"));
    }

    #[test]
    fn test_display_keeps_scale() {
        let money = Money::inr(dec("1500.00"));
        assert_eq!(money.to_string(), "1500.00 INR");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(CurrencyCode::from_str("INR"), Ok(CurrencyCode::INR));
        assert!(CurrencyCode::from_str("USD").is_err());
    }
}
