//! Price lookup.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use shopfront_commerce::VariantId;

use super::PriceArgs;
use crate::context::{find_product, Context};
use crate::output::price_with_offer;

/// Run the price command.
pub async fn run(args: PriceArgs, ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog(args.catalog.as_deref())?;
    let product = find_product(&catalog, &args.product)?;

    let variant_id = args.variant.map(VariantId::new);
    let variant = product.find_variant(variant_id.as_ref())?;

    let now = match args.at.as_deref() {
        Some(at) => DateTime::parse_from_rfc3339(at)
            .with_context(|| format!("Invalid timestamp: {}", at))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let resolved = product.resolve_price(variant, now);
    let stock = product.stock_for(variant);

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "productId": product.id,
            "variantId": variant.map(|v| &v.id),
            "price": resolved,
            "stock": stock,
            "isPreOrder": product.is_pre_order,
        }));
        return Ok(());
    }

    ctx.output.header(&product.name);
    if resolved.is_offer_active {
        ctx.output.kv(
            "price",
            &price_with_offer(
                &resolved.effective_price.display(),
                &resolved.selling_price.display(),
                resolved.discount_percent,
            ),
        );
        if let Some(left) = resolved.offer_ends_in(now) {
            ctx.output.kv("offer ends in", &format_countdown(left.num_seconds()));
        }
    } else {
        ctx.output.kv("price", &resolved.effective_price.display());
    }
    ctx.output.kv("stock", &stock.to_string());
    if product.is_pre_order {
        ctx.output.kv("availability", "preorder");
    }

    Ok(())
}

/// `3d 04:05:06` style countdown.
fn format_countdown(secs: i64) -> String {
    let secs = secs.max(0);
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(59), "00:00:59");
        assert_eq!(format_countdown(3_600 + 61), "01:01:01");
        assert_eq!(format_countdown(2 * 86_400 + 5), "2d 00:00:05");
        assert_eq!(format_countdown(-3), "00:00:00");
    }
}
