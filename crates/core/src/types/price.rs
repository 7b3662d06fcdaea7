//! Money amounts using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12, 2)` and always carry two decimal
//! places once normalized.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price, rounding the amount to two decimal places.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount: round_money(amount),
            currency_code,
        }
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

/// Round a money amount to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_price_rounds_to_cents() {
        let price = Price::new(Decimal::new(19_995, 3), CurrencyCode::USD);
        assert_eq!(price.amount, Decimal::new(2000, 2));
    }

    #[test]
    fn test_display() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::GBP);
        assert_eq!(price.display(), "£19.99");
    }
}
