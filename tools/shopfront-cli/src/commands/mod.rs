//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod gateway_return;
pub mod price;
pub mod quote;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use shopfront_commerce::checkout::{DeliveryZone, PaymentMethod};

/// Arguments for the price command.
#[derive(Args)]
pub struct PriceArgs {
    /// Product id.
    pub product: String,

    /// Variant id.
    #[arg(long)]
    pub variant: Option<String>,

    /// Resolve at this instant (RFC 3339) instead of now.
    #[arg(long)]
    pub at: Option<String>,

    /// Catalog file (default: storefront.catalog).
    #[arg(long)]
    pub catalog: Option<String>,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the basket.
    Show,
    /// Add a product to the cart, or reserve it if it is a preorder.
    Add {
        /// Product id.
        product: String,
        /// Variant id.
        #[arg(long)]
        variant: Option<String>,
        /// Quantity to add.
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// What to do if the add conflicts with the basket: clear or checkout.
        #[arg(long)]
        on_conflict: Option<String>,
        /// Catalog file (default: storefront.catalog).
        #[arg(long)]
        catalog: Option<String>,
    },
    /// Set a line's quantity; zero or less removes a cart line.
    Qty {
        /// Product id.
        product: String,
        /// New quantity.
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
        /// Variant id.
        #[arg(long)]
        variant: Option<String>,
    },
    /// Remove a cart line.
    Remove {
        /// Product id.
        product: String,
        /// Variant id.
        #[arg(long)]
        variant: Option<String>,
    },
    /// Set the store discount on the basket, in major units.
    Discount {
        amount: f64,
    },
    /// Empty the basket.
    Clear,
}

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    /// Delivery zone: inside_dhaka, sub_dhaka or outside_dhaka.
    #[arg(short, long)]
    pub zone: Option<String>,

    /// Payment method: cashOnDelivery, bkash, nagad or card.
    #[arg(short, long, default_value = "cashOnDelivery")]
    pub method: String,
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    #[command(subcommand)]
    pub command: CheckoutCommand,
}

#[derive(Subcommand)]
pub enum CheckoutCommand {
    /// Submit the checkout form.
    Submit(FormArgs),
    /// Retry the payment session of an order that has none.
    Retry,
    /// Cancel an order that has no payment session.
    Cancel,
    /// Show any checkout awaiting retry and any pending gateway payment.
    Status,
}

/// Checkout form fields.
#[derive(Args)]
pub struct FormArgs {
    /// Customer name.
    #[arg(long)]
    pub name: String,

    /// Mobile number, 01XXXXXXXXX.
    #[arg(long)]
    pub phone: String,

    /// Delivery address.
    #[arg(long)]
    pub address: String,

    /// Delivery zone: inside_dhaka, sub_dhaka or outside_dhaka.
    #[arg(short, long)]
    pub zone: Option<String>,

    /// Payment method: cashOnDelivery, bkash, nagad or card.
    #[arg(short, long, default_value = "cashOnDelivery")]
    pub method: String,

    /// Note for the order.
    #[arg(long)]
    pub note: Option<String>,
}

/// Arguments for the return command.
#[derive(Args)]
pub struct ReturnArgs {
    /// Return URL or its query string.
    pub url: String,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate configuration.
    Validate,
}

pub(crate) fn parse_zone(zone: Option<&str>) -> Result<Option<DeliveryZone>> {
    zone.map(|z| z.parse::<DeliveryZone>().map_err(|e| anyhow!("{e}")))
        .transpose()
}

pub(crate) fn parse_method(method: &str) -> Result<PaymentMethod> {
    method.parse::<PaymentMethod>().map_err(|e| anyhow!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zone_and_method() {
        assert_eq!(parse_zone(None).unwrap(), None);
        assert_eq!(
            parse_zone(Some("sub_dhaka")).unwrap(),
            Some(DeliveryZone::SubDhaka)
        );
        assert!(parse_zone(Some("mars")).is_err());

        assert_eq!(parse_method("bkash").unwrap(), PaymentMethod::Bkash);
        assert_eq!(parse_method("cashOnDelivery").unwrap(), PaymentMethod::CashOnDelivery);
        assert!(parse_method("cheque").is_err());
    }
}
