//! Checkout totals.

use serde::{Deserialize, Serialize};

use crate::checkout::{DeliveryZone, PaymentMethod};
use crate::config::BusinessConfig;
use crate::money::Money;
use crate::CommerceError;

/// Amounts shown on the checkout page and sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub delivery_charge: Money,
    /// Wallet promotion plus any basket-level discount.
    pub discount_amount: Money,
    /// `subtotal + delivery_charge - discount_amount`, floored at zero.
    pub total: Money,
    /// Amount the backend is told is due; depends on the courier mode.
    pub due_amount: Money,
}

impl CheckoutTotals {
    /// Compute totals for a basket subtotal.
    pub fn compute(
        config: &BusinessConfig,
        subtotal: Money,
        basket_discount: Money,
        zone: Option<DeliveryZone>,
        method: PaymentMethod,
    ) -> Result<Self, CommerceError> {
        let delivery_charge = config.delivery_fee(zone);
        let promo = config.wallet_promotion.discount_for(method, &subtotal);
        let discount_amount = promo
            .try_add(&basket_discount)
            .ok_or_else(|| currency_mismatch(&promo, &basket_discount))?;

        let gross = subtotal
            .try_add(&delivery_charge)
            .ok_or_else(|| currency_mismatch(&subtotal, &delivery_charge))?;
        let total = gross.saturating_sub(&discount_amount);

        let due_amount = if config.default_courier.reports_amount_before_delivery() {
            subtotal.saturating_sub(&discount_amount)
        } else {
            total
        };

        Ok(Self {
            subtotal,
            delivery_charge,
            discount_amount,
            total,
            due_amount,
        })
    }
}

fn currency_mismatch(a: &Money, b: &Money) -> CommerceError {
    CommerceError::CurrencyMismatch {
        expected: a.currency.code().to_string(),
        got: b.currency.code().to_string(),
    }
}
