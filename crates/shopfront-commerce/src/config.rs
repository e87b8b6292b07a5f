//! Business configuration consumed by pricing and checkout.
//!
//! Values are read-only inputs: the storefront loads them once and hands
//! them to the orchestrator. Amounts are written in major units (taka) so
//! configuration files stay readable.

use serde::{Deserialize, Serialize};

use crate::checkout::{DeliveryZone, PaymentMethod};
use crate::ids::CategoryId;
use crate::money::{Currency, Money};
use crate::CommerceError;

/// Storefront-wide business settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessConfig {
    /// Currency every price and fee is expressed in.
    #[serde(default)]
    pub currency: Currency,

    /// Delivery fee per zone.
    #[serde(default)]
    pub delivery_fees: DeliveryFees,

    /// Courier the backend books by default.
    #[serde(default)]
    pub default_courier: CourierMode,

    /// Flat discount for paying with the mobile wallet.
    #[serde(default)]
    pub wallet_promotion: WalletPromotion,

    /// Category metadata for labels and analytics.
    #[serde(default)]
    pub categories: Vec<CategoryMeta>,

    /// Path of the order-status page on the storefront.
    #[serde(default = "default_order_status_path")]
    pub order_status_path: String,

    /// Path of the checkout page, used by "go to checkout" prompts.
    #[serde(default = "default_checkout_path")]
    pub checkout_path: String,
}

fn default_order_status_path() -> String {
    "/order-status".to_string()
}

fn default_checkout_path() -> String {
    "/checkout".to_string()
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            delivery_fees: DeliveryFees::default(),
            default_courier: CourierMode::default(),
            wallet_promotion: WalletPromotion::default(),
            categories: Vec::new(),
            order_status_path: default_order_status_path(),
            checkout_path: default_checkout_path(),
        }
    }
}

impl BusinessConfig {
    /// Delivery fee for a zone; zero when no zone is selected.
    pub fn delivery_fee(&self, zone: Option<DeliveryZone>) -> Money {
        match zone {
            Some(zone) => Money::from_decimal(self.delivery_fees.fee_for(zone), self.currency),
            None => Money::zero(self.currency),
        }
    }

    /// Look up category metadata by id.
    pub fn category(&self, id: &CategoryId) -> Option<&CategoryMeta> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Reject configurations that would produce negative prices.
    pub fn validate(&self) -> Result<(), CommerceError> {
        for zone in DeliveryZone::ALL {
            let fee = self.delivery_fees.fee_for(zone);
            if !fee.is_finite() || fee < 0.0 {
                return Err(CommerceError::InvalidConfig(format!(
                    "delivery fee for {} must be a non-negative amount",
                    zone.as_str()
                )));
            }
        }

        let promo = &self.wallet_promotion;
        if !promo.amount.is_finite() || promo.amount < 0.0 {
            return Err(CommerceError::InvalidConfig(
                "wallet promotion amount must be non-negative".to_string(),
            ));
        }
        if !promo.min_subtotal.is_finite() || promo.min_subtotal < 0.0 {
            return Err(CommerceError::InvalidConfig(
                "wallet promotion threshold must be non-negative".to_string(),
            ));
        }
        if promo.enabled && !promo.method.is_gateway() {
            return Err(CommerceError::InvalidConfig(
                "wallet promotion must target a gateway payment method".to_string(),
            ));
        }

        if !self.order_status_path.starts_with('/') || !self.checkout_path.starts_with('/') {
            return Err(CommerceError::InvalidConfig(
                "storefront paths must start with '/'".to_string(),
            ));
        }

        Ok(())
    }
}

/// Delivery fee per zone, in major units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryFees {
    pub inside_dhaka: f64,
    pub sub_dhaka: f64,
    pub outside_dhaka: f64,
}

impl DeliveryFees {
    /// Fee for a zone, in major units.
    pub fn fee_for(&self, zone: DeliveryZone) -> f64 {
        match zone {
            DeliveryZone::InsideDhaka => self.inside_dhaka,
            DeliveryZone::SubDhaka => self.sub_dhaka,
            DeliveryZone::OutsideDhaka => self.outside_dhaka,
        }
    }
}

impl Default for DeliveryFees {
    fn default() -> Self {
        Self {
            inside_dhaka: 80.0,
            sub_dhaka: 100.0,
            outside_dhaka: 130.0,
        }
    }
}

/// Courier the backend books orders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CourierMode {
    #[default]
    Steadfast,
    Pathao,
    Redx,
    /// Customer collects from the office.
    OfficeDelivery,
}

impl CourierMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourierMode::Steadfast => "steadfast",
            CourierMode::Pathao => "pathao",
            CourierMode::Redx => "redx",
            CourierMode::OfficeDelivery => "office_delivery",
        }
    }

    /// Whether the backend is told the pre-delivery-fee amount is due.
    ///
    /// Accounting convention only; the customer-facing total is unchanged.
    pub fn reports_amount_before_delivery(&self) -> bool {
        matches!(self, CourierMode::OfficeDelivery)
    }
}

/// Flat promotional discount for paying with a specific gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletPromotion {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Gateway the promotion applies to.
    pub method: PaymentMethod,
    /// Discount in major units.
    pub amount: f64,
    /// Subtotal must be strictly greater than this, in major units.
    pub min_subtotal: f64,
}

fn default_true() -> bool {
    true
}

impl Default for WalletPromotion {
    fn default() -> Self {
        Self {
            enabled: true,
            method: PaymentMethod::Bkash,
            amount: 200.0,
            min_subtotal: 500.0,
        }
    }
}

impl WalletPromotion {
    /// Discount for a given method and subtotal.
    pub fn discount_for(&self, method: PaymentMethod, subtotal: &Money) -> Money {
        let threshold = Money::from_decimal(self.min_subtotal, subtotal.currency);
        if self.enabled && method == self.method && subtotal.amount_minor > threshold.amount_minor {
            Money::from_decimal(self.amount, subtotal.currency)
        } else {
            Money::zero(subtotal.currency)
        }
    }
}

/// Category metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMeta {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fees() {
        let config = BusinessConfig::default();
        assert_eq!(
            config.delivery_fee(Some(DeliveryZone::InsideDhaka)),
            Money::from_major(80, Currency::BDT)
        );
        assert!(config.delivery_fee(None).is_zero());
    }

    #[test]
    fn test_wallet_promotion_threshold_is_strict() {
        let promo = WalletPromotion::default();
        let at = Money::from_major(500, Currency::BDT);
        let above = Money::from_major(501, Currency::BDT);

        assert!(promo.discount_for(PaymentMethod::Bkash, &at).is_zero());
        assert_eq!(
            promo.discount_for(PaymentMethod::Bkash, &above),
            Money::from_major(200, Currency::BDT)
        );
        assert!(promo.discount_for(PaymentMethod::Nagad, &above).is_zero());
    }

    #[test]
    fn test_disabled_promotion() {
        let promo = WalletPromotion {
            enabled: false,
            ..WalletPromotion::default()
        };
        let subtotal = Money::from_major(1000, Currency::BDT);
        assert!(promo.discount_for(PaymentMethod::Bkash, &subtotal).is_zero());
    }

    #[test]
    fn test_office_delivery_reports_before_fee() {
        assert!(CourierMode::OfficeDelivery.reports_amount_before_delivery());
        assert!(!CourierMode::Steadfast.reports_amount_before_delivery());
    }

    #[test]
    fn test_validate_rejects_negative_fee() {
        let mut config = BusinessConfig::default();
        config.delivery_fees.sub_dhaka = -1.0;
        assert!(matches!(
            config.validate(),
            Err(CommerceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_cod_promotion() {
        let mut config = BusinessConfig::default();
        config.wallet_promotion.method = PaymentMethod::CashOnDelivery;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: BusinessConfig = serde_json::from_str(
            r#"{"default_courier":"office_delivery","delivery_fees":{"inside_dhaka":60,"sub_dhaka":90,"outside_dhaka":120}}"#,
        )
        .unwrap();
        assert_eq!(config.default_courier, CourierMode::OfficeDelivery);
        assert_eq!(config.delivery_fees.inside_dhaka, 60.0);
        assert_eq!(config.order_status_path, "/order-status");
        assert!(config.validate().is_ok());
    }
}
