//! Checkout quote.

use anyhow::Result;
use shopfront_commerce::checkout::CheckoutTotals;

use super::{parse_method, parse_zone, QuoteArgs};
use crate::context::Context;

/// Run the quote command.
pub async fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let zone = parse_zone(args.zone.as_deref())?;
    let method = parse_method(&args.method)?;

    let cache = ctx.cache()?;
    let session = ctx.basket(&cache)?;
    if session.basket().is_empty() {
        ctx.output.warn("Basket is empty");
    }

    let subtotal = session.subtotal()?;
    let basket_discount = session.discount();
    let totals = CheckoutTotals::compute(&ctx.config.business, subtotal, basket_discount, zone, method)?;

    if ctx.output.is_json() {
        ctx.output.json(&totals);
        return Ok(());
    }

    ctx.output.header("Order Summary");
    ctx.output.kv("subtotal", &totals.subtotal.display());
    match zone {
        Some(zone) => ctx
            .output
            .kv(&format!("delivery ({})", zone), &totals.delivery_charge.display()),
        None => ctx.output.kv("delivery", "select a zone"),
    }
    if totals.discount_amount.is_positive() {
        ctx.output
            .kv("discount", &format!("-{}", totals.discount_amount.display()));
    }
    ctx.output.kv("total", &totals.total.display());
    if totals.due_amount != totals.total {
        ctx.output.kv("due to courier", &totals.due_amount.display());
    }

    Ok(())
}
