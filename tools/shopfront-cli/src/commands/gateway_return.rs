//! Gateway return reconciliation.

use anyhow::{bail, Result};
use shopfront_commerce::checkout::{AnalyticsSink, TracingAnalytics};
use shopfront_commerce::recovery::{RecoveryStore, ReturnOutcome};

use super::ReturnArgs;
use crate::context::Context;
use crate::output::status_badge;

/// Run the return command.
pub async fn run(args: ReturnArgs, ctx: &Context) -> Result<()> {
    let query = query_part(&args.url);

    let cache = ctx.cache()?;
    let mut session = ctx.basket(&cache)?;
    let recovery = RecoveryStore::new(cache.clone());

    let outcome = recovery.reconcile_return(query, &mut session)?;
    session.save(&cache)?;

    match outcome {
        ReturnOutcome::Success { status, analytics } => {
            if let Some(event) = &analytics {
                TracingAnalytics.purchase(event).await;
            }

            let summary = status.summary();
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({
                    "status": status,
                    "summary": summary,
                }));
                return Ok(());
            }

            ctx.output.header("Order Status");
            ctx.output.kv("status", &status_badge(status.status.as_str()));
            if let Some(id) = &status.business_order_id {
                ctx.output.kv("order", id.as_str());
            }
            if let Some(id) = &status.transaction_id {
                ctx.output.kv("transaction", id.as_str());
            }
            for item in &status.items {
                ctx.output
                    .list_item(&format!("{} x{} @ {:.2}", item.name, item.quantity, item.price));
            }
            ctx.output.kv("subtotal", &format!("{:.2}", summary.subtotal));
            ctx.output.kv("delivery", &format!("{:.2}", summary.delivery_charge));
            if summary.discount > 0.0 {
                ctx.output.kv("discount", &format!("-{:.2}", summary.discount));
            }
            ctx.output.kv("total", &format!("{:.2}", summary.total));
            ctx.output.success("Payment complete");
            Ok(())
        }
        ReturnOutcome::Failure { message, pending } => {
            if let Some(pending) = &pending {
                ctx.output.kv("order", pending.business_order_id.as_str());
                ctx.output.kv("transaction", pending.transaction_id.as_str());
            }
            bail!(message)
        }
    }
}

/// Accept a full return URL or just its query string.
fn query_part(url: &str) -> &str {
    match url.split_once('?') {
        Some((_, query)) => query,
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_part() {
        assert_eq!(
            query_part("https://shop.example.com/order-status?status=success&orderId=o-1"),
            "status=success&orderId=o-1"
        );
        assert_eq!(query_part("status=failed"), "status=failed");
    }
}
