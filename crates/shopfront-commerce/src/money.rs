//! Amounts in integer minor units.
//!
//! Line totals, delivery fees and discounts are summed as poisha so that
//! `price * quantity` never drifts. Conversion to decimal happens only at the
//! wire and display edges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Currencies a storefront can price in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    BDT,
    USD,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::BDT => "BDT",
            Currency::USD => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::BDT => "\u{09f3}",
            Currency::USD => "$",
        }
    }

    /// Minor units per major unit, as a power of ten.
    pub fn decimal_places(&self) -> u32 {
        2
    }

    fn minor_per_major(&self) -> i64 {
        10_i64.pow(self.decimal_places())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An amount tagged with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    pub amount_minor: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Whole major units, e.g. `from_major(500, BDT)` is ৳500.00.
    pub fn from_major(amount: i64, currency: Currency) -> Self {
        Self::new(amount.saturating_mul(currency.minor_per_major()), currency)
    }

    /// Decimal major units, rounded to the nearest minor unit.
    ///
    /// ```
    /// use shopfront_commerce::money::{Money, Currency};
    /// let price = Money::from_decimal(499.50, Currency::BDT);
    /// assert_eq!(price.amount_minor, 49950);
    /// ```
    pub fn from_decimal(amount: f64, currency: Currency) -> Self {
        let minor = (amount * currency.minor_per_major() as f64).round() as i64;
        Self::new(minor, currency)
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    /// Decimal major units, as the backend and the status URL carry them.
    pub fn to_decimal(&self) -> f64 {
        self.amount_minor as f64 / self.currency.minor_per_major() as f64
    }

    /// `৳1080.00`
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.display_amount())
    }

    /// `1080.00`
    pub fn display_amount(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        format!("{:.places$}", self.to_decimal())
    }

    /// None on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        self.combine(other, i64::checked_add)
    }

    /// None on currency mismatch or overflow.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        self.combine(other, i64::checked_sub)
    }

    /// None on overflow.
    pub fn try_multiply(&self, factor: i64) -> Option<Money> {
        self.amount_minor
            .checked_mul(factor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Subtract, flooring at zero. Totals are never negative.
    pub fn saturating_sub(&self, other: &Money) -> Money {
        Money::new(
            self.amount_minor.saturating_sub(other.amount_minor).max(0),
            self.currency,
        )
    }

    fn combine(&self, other: &Money, op: fn(i64, i64) -> Option<i64>) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        op(self.amount_minor, other.amount_minor).map(|amount| Money::new(amount, self.currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
