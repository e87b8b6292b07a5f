//! Checkout commands.

use anyhow::{anyhow, bail, Result};
use shopfront_cache::Cache;
use shopfront_commerce::checkout::{CheckoutForm, CheckoutOutcome, CheckoutSaga};
use shopfront_commerce::recovery::RecoveryStore;

use super::{parse_method, parse_zone, CheckoutArgs, CheckoutCommand, FormArgs};
use crate::context::Context;
use crate::output::status_badge;

/// Session key for a checkout whose order exists without a payment session.
const SAGA_KEY: &str = "checkoutSaga";

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    match args.command {
        CheckoutCommand::Submit(form) => submit(form, ctx).await,
        CheckoutCommand::Retry => retry(ctx).await,
        CheckoutCommand::Cancel => cancel(ctx).await,
        CheckoutCommand::Status => status(ctx),
    }
}

async fn submit(args: FormArgs, ctx: &Context) -> Result<()> {
    let form = CheckoutForm {
        name: args.name,
        phone: args.phone,
        address: args.address,
        delivery_zone: parse_zone(args.zone.as_deref())?,
        note: args.note,
        payment_method: parse_method(&args.method)?,
    };

    let cache = ctx.cache()?;
    let mut session = ctx.basket(&cache)?;
    let orchestrator = ctx.orchestrator(cache.clone())?;

    let spinner = ctx.output.spinner("Placing order...");
    let outcome = orchestrator.submit(&mut session, &form).await;
    spinner.finish_and_clear();

    session.save(&cache)?;
    report(ctx, &cache, outcome)
}

async fn retry(ctx: &Context) -> Result<()> {
    let cache = ctx.cache()?;
    let saga = saved_saga(&cache)?;
    let orchestrator = ctx.orchestrator(cache.clone())?;

    let spinner = ctx.output.spinner("Opening payment session...");
    let outcome = orchestrator.retry_payment(saga).await;
    spinner.finish_and_clear();

    report(ctx, &cache, outcome)
}

async fn cancel(ctx: &Context) -> Result<()> {
    let cache = ctx.cache()?;
    let saga = saved_saga(&cache)?;
    let orchestrator = ctx.orchestrator(cache.clone())?;

    match orchestrator.cancel(saga).await {
        Ok(saga) => {
            cache.delete(SAGA_KEY)?;
            if ctx.output.is_json() {
                ctx.output.json(&saga);
            } else if let Some(order) = saga.order() {
                ctx.output
                    .success(&format!("Order {} cancelled", order.business_order_id));
            }
            Ok(())
        }
        Err(e) => bail!(e.user_message()),
    }
}

fn status(ctx: &Context) -> Result<()> {
    let cache = ctx.cache()?;
    let saga: Option<CheckoutSaga> = cache.get(SAGA_KEY)?;
    let pending = RecoveryStore::new(cache).pending()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "checkout": saga,
            "pendingPayment": pending,
        }));
        return Ok(());
    }

    ctx.output.header("Checkout");
    match &saga {
        Some(saga) => {
            ctx.output.kv("state", &status_badge(saga.state().as_str()));
            ctx.output.kv("method", saga.payment_method().as_str());
            if let Some(order) = saga.order() {
                ctx.output.kv("order", order.business_order_id.as_str());
            }
        }
        None => ctx.output.info("Nothing awaiting retry"),
    }

    ctx.output.header("Pending payment");
    match &pending {
        Some(pending) => {
            ctx.output.kv("order", pending.business_order_id.as_str());
            ctx.output.kv("transaction", pending.transaction_id.as_str());
            ctx.output.kv("method", pending.analytics.payment_method.as_str());
            ctx.output
                .kv("started", &pending.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        }
        None => ctx.output.info("None"),
    }

    Ok(())
}

fn saved_saga(cache: &Cache) -> Result<CheckoutSaga> {
    cache
        .get(SAGA_KEY)?
        .ok_or_else(|| anyhow!("No checkout is awaiting a payment session"))
}

fn report(ctx: &Context, cache: &Cache, outcome: CheckoutOutcome) -> Result<()> {
    match outcome {
        CheckoutOutcome::Invalid(errors) => {
            if ctx.output.is_json() {
                ctx.output.json(&errors);
            } else {
                for error in &errors.errors {
                    ctx.output.kv(error.field.as_str(), error.message);
                }
            }
            bail!("Checkout form has {} error(s)", errors.errors.len())
        }
        CheckoutOutcome::OrderPlaced { order, status_url } => {
            cache.delete(SAGA_KEY)?;
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({
                    "status": "success",
                    "order": order,
                    "statusUrl": status_url,
                }));
            } else {
                ctx.output
                    .success(&format!("Order {} placed", order.business_order_id));
                ctx.output.kv("status page", &status_url);
            }
            Ok(())
        }
        CheckoutOutcome::OrderFailed { message, status_url } => {
            if !ctx.output.is_json() {
                ctx.output.kv("status page", &status_url);
            }
            bail!(message)
        }
        CheckoutOutcome::RedirectToGateway {
            order,
            transaction_id,
            redirect_url,
        } => {
            cache.delete(SAGA_KEY)?;
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({
                    "status": "redirect",
                    "order": order,
                    "transactionId": transaction_id,
                    "redirectUrl": redirect_url,
                }));
            } else {
                ctx.output
                    .success(&format!("Order {} created", order.business_order_id));
                ctx.output.info("Complete the payment at:");
                println!("{}", redirect_url);
            }
            Ok(())
        }
        CheckoutOutcome::Toast { error, saga } => {
            if let Some(saga) = saga.filter(CheckoutSaga::is_awaiting_payment) {
                cache.set(SAGA_KEY, &saga)?;
                ctx.output.warn(
                    "The order exists without a payment session. Run `shopfront checkout retry` or `shopfront checkout cancel`.",
                );
            }
            bail!(error.user_message())
        }
    }
}
