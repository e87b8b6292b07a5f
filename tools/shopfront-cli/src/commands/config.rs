//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use shopfront_commerce::checkout::DeliveryZone;
use shopfront_data::FetchClient;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    let business = &ctx.config.business;

    ctx.output.info("[business]");
    ctx.output.kv("currency", business.currency.code());
    ctx.output.kv("default_courier", business.default_courier.as_str());
    ctx.output.kv("order_status_path", &business.order_status_path);
    ctx.output.kv("checkout_path", &business.checkout_path);

    ctx.output.info("[business.delivery_fees]");
    for zone in DeliveryZone::ALL {
        ctx.output
            .kv(zone.as_str(), &business.delivery_fee(Some(zone)).display());
    }

    let promo = &business.wallet_promotion;
    ctx.output.info("[business.wallet_promotion]");
    ctx.output.kv("enabled", &promo.enabled.to_string());
    ctx.output.kv("method", promo.method.as_str());
    ctx.output.kv("amount", &promo.amount.to_string());
    ctx.output.kv("min_subtotal", &promo.min_subtotal.to_string());

    if !business.categories.is_empty() {
        ctx.output.info("Categories:");
        for category in &business.categories {
            ctx.output
                .list_item(&format!("{} ({})", category.name, category.slug));
        }
    }

    ctx.output.info("[api]");
    ctx.output.kv(
        "commerce_url",
        ctx.config.api.commerce_url.as_deref().unwrap_or("(unset)"),
    );
    ctx.output
        .kv("payment_url", ctx.config.api.payment_base().unwrap_or("(unset)"));
    ctx.output.kv("timeout_ms", &ctx.config.api.timeout_ms.to_string());

    ctx.output.info("[storefront]");
    ctx.output.kv(
        "catalog",
        ctx.config.storefront.catalog.as_deref().unwrap_or("(unset)"),
    );
    ctx.output.kv("state_dir", &ctx.config.storefront.state_dir);

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("shopfront.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check(&ctx.config);

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

fn check(config: &CliConfig) -> (Vec<String>, Vec<String>) {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if let Err(e) = config.business.validate() {
        errors.push(e.to_string());
    }

    let api = &config.api;
    let timeouts = shopfront_data::TimeoutConfig::from_total(api.timeout());
    match api.commerce_url.as_deref() {
        Some(url) => {
            if let Err(e) = FetchClient::new(url, timeouts) {
                errors.push(format!("api.commerce_url: {}", e));
            }
        }
        None => warnings.push("api.commerce_url is not set; checkout is unavailable".to_string()),
    }
    if let Some(url) = api.payment_url.as_deref() {
        if let Err(e) = FetchClient::new(url, timeouts) {
            errors.push(format!("api.payment_url: {}", e));
        }
    }
    if api.timeout_ms == 0 {
        errors.push("api.timeout_ms must be greater than zero".to_string());
    }

    if config.storefront.catalog.is_none() {
        warnings.push("storefront.catalog is not set".to_string());
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_default_config() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        let (errors, warnings) = check(&config);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_check_rejects_bad_url_and_zero_timeout() {
        let mut config = CliConfig::default();
        config.api.commerce_url = Some("not a url".to_string());
        config.api.timeout_ms = 0;
        let (errors, _) = check(&config);
        assert_eq!(errors.len(), 2);
    }
}
