//! Purchase analytics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::checkout::{mask_phone, OrderLine, PaymentMethod};
use crate::ids::{BusinessOrderId, OrderId, TransactionId};
use crate::money::Currency;

/// Items, customer and totals of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseEvent {
    pub order_id: OrderId,
    pub business_order_id: BusinessOrderId,
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    pub payment_method: PaymentMethod,
    pub currency: Currency,
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub items: Vec<OrderLine>,
    pub subtotal: f64,
    pub delivery_charge: f64,
    pub discount: f64,
    pub total: f64,
}

/// Receives purchase events. Failures are the sink's own business.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn purchase(&self, event: &PurchaseEvent);
}

/// Writes purchase events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

#[async_trait]
impl AnalyticsSink for TracingAnalytics {
    async fn purchase(&self, event: &PurchaseEvent) {
        tracing::info!(
            target: "shopfront::analytics",
            order_id = %event.order_id,
            business_order_id = %event.business_order_id,
            method = %event.payment_method,
            currency = event.currency.code(),
            items = event.items.len(),
            total = event.total,
            phone = %mask_phone(&event.phone),
            "purchase"
        );
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

#[async_trait]
impl AnalyticsSink for NoopAnalytics {
    async fn purchase(&self, _event: &PurchaseEvent) {}
}
