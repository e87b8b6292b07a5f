//! CLI configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shopfront_commerce::BusinessConfig;

/// Overrides `api.commerce_url`.
pub const COMMERCE_API_ENV: &str = "SHOPFRONT_COMMERCE_API";
/// Overrides `api.payment_url`.
pub const PAYMENT_API_ENV: &str = "SHOPFRONT_PAYMENT_API";

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Pricing, delivery and promotion settings.
    #[serde(default)]
    pub business: BusinessConfig,

    /// External API endpoints.
    #[serde(default)]
    pub api: ApiConfig,

    /// Local storefront settings.
    #[serde(default)]
    pub storefront: StorefrontConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))?
        };

        config
            .business
            .validate()
            .with_context(|| format!("Invalid business settings in {}", path))?;
        Ok(config)
    }

    /// Apply environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        self.api.apply_overrides(
            std::env::var(COMMERCE_API_ENV).ok(),
            std::env::var(PAYMENT_API_ENV).ok(),
        );
        self
    }
}

/// External API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the commerce API.
    #[serde(default)]
    pub commerce_url: Option<String>,

    /// Base URL of the payment API. Defaults to the commerce API.
    #[serde(default)]
    pub payment_url: Option<String>,

    /// Total timeout per call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            commerce_url: None,
            payment_url: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    fn apply_overrides(&mut self, commerce: Option<String>, payment: Option<String>) {
        if let Some(url) = commerce.filter(|u| !u.trim().is_empty()) {
            self.commerce_url = Some(url);
        }
        if let Some(url) = payment.filter(|u| !u.trim().is_empty()) {
            self.payment_url = Some(url);
        }
    }

    /// Payment API base, falling back to the commerce API.
    pub fn payment_base(&self) -> Option<&str> {
        self.payment_url.as_deref().or(self.commerce_url.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Local storefront settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Product catalog, a JSON array of products.
    #[serde(default)]
    pub catalog: Option<String>,

    /// Where basket and recovery state are kept.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

fn default_state_dir() -> String {
    ".shopfront".to_string()
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            state_dir: default_state_dir(),
        }
    }
}

/// Generate a default shopfront.toml config file.
pub fn generate_default_config() -> String {
    r#"# Shopfront configuration

[business]
currency = "BDT"
default_courier = "steadfast"
order_status_path = "/order-status"
checkout_path = "/checkout"

[business.delivery_fees]
inside_dhaka = 80
sub_dhaka = 100
outside_dhaka = 130

[business.wallet_promotion]
enabled = true
method = "bkash"
amount = 200
min_subtotal = 500

[api]
# commerce_url = "https://api.example.com/v1"
# payment_url = "https://pay.example.com/v1"
timeout_ms = 30000

[storefront]
catalog = "catalog.json"
state_dir = ".shopfront"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_commerce::checkout::{DeliveryZone, PaymentMethod};
    use shopfront_commerce::config::CourierMode;

    #[test]
    fn test_default_config_parses() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.business, BusinessConfig::default());
        assert_eq!(config.business.default_courier, CourierMode::Steadfast);
        assert_eq!(config.business.wallet_promotion.method, PaymentMethod::Bkash);
        assert_eq!(
            config.business.delivery_fees.fee_for(DeliveryZone::SubDhaka),
            100.0
        );
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.storefront.catalog.as_deref(), Some("catalog.json"));
    }

    #[test]
    fn test_load_rejects_negative_fee() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopfront.toml");
        std::fs::write(
            &path,
            "[business.delivery_fees]\ninside_dhaka = -1\nsub_dhaka = 0\noutside_dhaka = 0\n",
        )
        .unwrap();
        assert!(CliConfig::load(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_env_overrides_and_payment_fallback() {
        let mut api = ApiConfig {
            commerce_url: Some("https://a.example.com".into()),
            ..ApiConfig::default()
        };
        assert_eq!(api.payment_base(), Some("https://a.example.com"));

        api.apply_overrides(None, Some("https://pay.example.com".into()));
        assert_eq!(api.payment_base(), Some("https://pay.example.com"));

        api.apply_overrides(Some("  ".into()), None);
        assert_eq!(api.commerce_url.as_deref(), Some("https://a.example.com"));
    }
}
