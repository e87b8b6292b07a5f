//! Basket commands.

use anyhow::{bail, Result};
use chrono::Utc;
use dialoguer::{theme::ColorfulTheme, Select};
use shopfront_commerce::cart::{
    AddOutcome, BasketAdd, BasketSession, ConflictPrompt, LineItem, MergeOutcome, PreorderItem,
    Resolution, ResolveOutcome,
};
use shopfront_commerce::{Money, ProductId, VariantId};

use super::{CartArgs, CartCommand};
use crate::context::{find_product, Context};

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let cache = ctx.cache()?;
    let mut session = ctx.basket(&cache)?;

    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => {}
        CartCommand::Add {
            product,
            variant,
            quantity,
            on_conflict,
            catalog,
        } => {
            let resolution = on_conflict.as_deref().map(parse_resolution).transpose()?;
            let catalog = ctx.catalog(catalog.as_deref())?;
            let product = find_product(&catalog, &product)?;
            let variant_id = variant.map(VariantId::new);
            let now = Utc::now();

            let add = if product.is_pre_order {
                BasketAdd::Preorder(PreorderItem::from_catalog(product, variant_id.as_ref(), quantity, now)?)
            } else {
                BasketAdd::Regular(LineItem::from_catalog(product, variant_id.as_ref(), quantity, now)?)
            };

            match session.request_add(add)? {
                AddOutcome::Applied(outcome) => report_merge(ctx, &product.name, outcome),
                AddOutcome::Blocked(prompt) => {
                    let Some(resolution) = resolution.or_else(|| ask(ctx, &prompt)) else {
                        session.dismiss_prompt();
                        ctx.output.warn(&format!(
                            "{}. Pass --on-conflict clear or --on-conflict checkout.",
                            prompt.title()
                        ));
                        return Ok(());
                    };
                    match session.resolve(resolution)? {
                        ResolveOutcome::Applied(outcome) => report_merge(ctx, &product.name, outcome),
                        ResolveOutcome::GoToCheckout => ctx.output.info(&format!(
                            "Basket unchanged; continue at {}",
                            ctx.config.business.checkout_path
                        )),
                        ResolveOutcome::NothingPending => {}
                    }
                }
            }
        }
        CartCommand::Qty {
            product,
            quantity,
            variant,
        } => {
            if session.basket().is_preorder() {
                session.update_preorder_quantity(quantity);
            } else {
                let variant_id = variant.map(VariantId::new);
                if !session.update_quantity(&ProductId::new(product.clone()), variant_id.as_ref(), quantity) {
                    bail!("Not in cart: {}", product);
                }
            }
        }
        CartCommand::Remove { product, variant } => {
            let variant_id = variant.map(VariantId::new);
            if !session.remove(&ProductId::new(product.clone()), variant_id.as_ref()) {
                bail!("Not in cart: {}", product);
            }
            ctx.output.success(&format!("Removed {}", product));
        }
        CartCommand::Discount { amount } => {
            if !amount.is_finite() || amount < 0.0 {
                bail!("Discount must be a non-negative amount");
            }
            session.set_discount(Money::from_decimal(amount, session.currency()));
        }
        CartCommand::Clear => {
            session.clear_all();
            ctx.output.success("Basket cleared");
        }
    }

    session.save(&cache)?;
    show(ctx, &session)
}

fn parse_resolution(value: &str) -> Result<Resolution> {
    match value {
        "clear" => Ok(Resolution::ClearAndProceed),
        "checkout" => Ok(Resolution::GoToCheckout),
        other => bail!("Unknown conflict resolution: {} (expected clear or checkout)", other),
    }
}

/// Ask interactively; `None` when there is no one to ask or they back out.
fn ask(ctx: &Context, prompt: &ConflictPrompt) -> Option<Resolution> {
    if ctx.output.is_json() || !console::user_attended() {
        return None;
    }

    let choices = prompt.resolutions();
    let labels: Vec<&str> = choices.iter().map(|r| prompt.label(*r)).collect();
    let picked = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt.title())
        .items(&labels)
        .default(0)
        .interact_opt()
        .ok()
        .flatten()?;
    choices.get(picked).copied()
}

fn report_merge(ctx: &Context, name: &str, outcome: MergeOutcome) {
    match outcome {
        MergeOutcome::Inserted { quantity } => {
            ctx.output.success(&format!("Added {} x{}", name, quantity))
        }
        MergeOutcome::Merged { quantity } => {
            ctx.output.success(&format!("{} now x{}", name, quantity))
        }
        MergeOutcome::Rejected => ctx.output.warn(&format!("{} is out of stock", name)),
    }
}

fn show(ctx: &Context, session: &BasketSession) -> Result<()> {
    let basket = session.basket();
    let lines = session.checkout_lines();
    let subtotal = session.subtotal()?;
    let discount = session.discount();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "state": session.state(),
            "items": lines,
            "itemCount": basket.item_count(),
            "subtotal": subtotal,
            "discount": discount,
        }));
        return Ok(());
    }

    let title = if basket.is_preorder() { "Preorder" } else { "Cart" };
    ctx.output.header(title);
    if lines.is_empty() {
        ctx.output.info("Empty");
        return Ok(());
    }

    let widths = [28, 14, 5, 12];
    ctx.output.table_row(&["ITEM", "PRICE", "QTY", "TOTAL"], &widths);
    for line in &lines {
        let name = match &line.variant_label {
            Some(label) => format!("{} ({})", line.name, label),
            None => line.name.clone(),
        };
        let total = line
            .line_total()
            .map(|m| m.display())
            .unwrap_or_else(|| "-".to_string());
        let price = line.price.display();
        let quantity = line.quantity.to_string();
        ctx.output.table_row(
            &[name.as_str(), price.as_str(), quantity.as_str(), total.as_str()],
            &widths,
        );
    }
    ctx.output.kv("subtotal", &subtotal.display());
    if discount.is_positive() {
        ctx.output.kv("discount", &format!("-{}", discount.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("clear").unwrap(), Resolution::ClearAndProceed);
        assert_eq!(parse_resolution("checkout").unwrap(), Resolution::GoToCheckout);
        assert!(parse_resolution("keep").is_err());
    }
}
