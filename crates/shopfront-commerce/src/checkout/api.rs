//! Contracts with the external Commerce and Payment APIs.
//!
//! Amounts on the wire are decimal major units, as the backend expects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CheckoutLine;
use crate::checkout::{CheckoutForm, CheckoutTotals, DeliveryZone, PaymentMethod};
use crate::config::CourierMode;
use crate::ids::{BusinessOrderId, OrderId, ProductId, TransactionId, VariantId};
use crate::CommerceError;

/// Shown when the server gives no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "কিছু একটা সমস্যা হয়েছে। আবার চেষ্টা করুন।";

/// Failure reported by, or while talking to, an external API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with an error status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("request rejected"))]
    Rejected { status: u16, message: Option<String> },

    /// The request never got a response.
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The response body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref().filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }

    /// What to show the customer.
    pub fn user_message(&self) -> String {
        self.server_message()
            .unwrap_or(GENERIC_ERROR_MESSAGE)
            .to_string()
    }
}

/// User-facing text for any checkout failure.
pub fn user_message(error: &CommerceError) -> String {
    match error {
        CommerceError::Api(api) => api.user_message(),
        _ => GENERIC_ERROR_MESSAGE.to_string(),
    }
}

/// One basket line as sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl From<&CheckoutLine> for OrderLine {
    fn from(line: &CheckoutLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            name: line.name.clone(),
            price: line.price.to_decimal(),
            quantity: line.quantity,
            variant: line.variant_label.clone(),
        }
    }
}

/// Payload for `create_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub delivery_zone: Option<DeliveryZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    pub courier: CourierMode,
    pub is_pre_order: bool,
    pub items: Vec<OrderLine>,
    pub subtotal: f64,
    pub delivery_charge: f64,
    pub discount: f64,
    pub total: f64,
    pub due_amount: f64,
}

impl CreateOrderRequest {
    pub fn new(
        form: &CheckoutForm,
        lines: &[CheckoutLine],
        totals: &CheckoutTotals,
        courier: CourierMode,
        is_pre_order: bool,
        transaction_id: Option<TransactionId>,
    ) -> Self {
        Self {
            customer_name: form.name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            address: form.address.trim().to_string(),
            delivery_zone: form.delivery_zone,
            note: form.note_text().map(str::to_string),
            payment_method: form.payment_method,
            transaction_id,
            courier,
            is_pre_order,
            items: lines.iter().map(OrderLine::from).collect(),
            subtotal: totals.subtotal.to_decimal(),
            delivery_charge: totals.delivery_charge.to_decimal(),
            discount: totals.discount_amount.to_decimal(),
            total: totals.total.to_decimal(),
            due_amount: totals.due_amount.to_decimal(),
        }
    }
}

/// Raw `create_order` response. Identifiers may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub business_order_id: Option<String>,
}

/// An order the backend has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub business_order_id: BusinessOrderId,
}

impl CreateOrderResponse {
    /// Both identifiers are required; a response without them is a failure.
    pub fn into_created(self) -> Result<CreatedOrder, CommerceError> {
        let order_id = non_blank(self.order_id).ok_or(CommerceError::MissingIdentifier("order id"))?;
        let business_order_id = non_blank(self.business_order_id)
            .ok_or(CommerceError::MissingIdentifier("business order id"))?;
        Ok(CreatedOrder {
            order_id: OrderId::new(order_id),
            business_order_id: BusinessOrderId::new(business_order_id),
        })
    }
}

/// Payload for `create_payment_session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    pub order_id: OrderId,
    pub business_order_id: BusinessOrderId,
    pub transaction_id: TransactionId,
    pub payment_method: PaymentMethod,
    pub amount: f64,
    pub customer_name: String,
    pub phone: String,
    pub items: Vec<OrderLine>,
}

/// Raw `create_payment_session` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionResponse {
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl PaymentSessionResponse {
    pub fn into_redirect_url(self) -> Result<String, CommerceError> {
        non_blank(self.redirect_url).ok_or(CommerceError::MissingIdentifier("redirect url"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Order creation and cancellation.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// Create an order. Not idempotent server-side.
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreateOrderResponse, ApiError>;

    /// Cancel an order that never got a payment session.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), ApiError>;
}

/// Payment-session creation for redirect gateways.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    async fn create_payment_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSessionResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::Rejected {
            status: 422,
            message: Some("স্টক শেষ".to_string()),
        };
        assert_eq!(err.user_message(), "স্টক শেষ");
        assert_eq!(ApiError::Timeout.user_message(), GENERIC_ERROR_MESSAGE);

        let blank = ApiError::Rejected {
            status: 500,
            message: Some("  ".to_string()),
        };
        assert_eq!(blank.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_rejected_display() {
        let err = ApiError::Rejected { status: 500, message: None };
        assert_eq!(err.to_string(), "HTTP 500: request rejected");
    }

    #[test]
    fn test_missing_identifiers_are_failures() {
        let missing = CreateOrderResponse {
            order_id: Some("o-1".to_string()),
            business_order_id: None,
        };
        assert!(matches!(
            missing.into_created(),
            Err(CommerceError::MissingIdentifier("business order id"))
        ));

        let blank = PaymentSessionResponse {
            redirect_url: Some(String::new()),
        };
        assert!(blank.into_redirect_url().is_err());
    }

    #[test]
    fn test_response_deserializes_camel_case() {
        let resp: CreateOrderResponse =
            serde_json::from_str(r#"{"orderId":"o-9","businessOrderId":"SF-1009"}"#).unwrap();
        let created = resp.into_created().unwrap();
        assert_eq!(created.order_id.as_str(), "o-9");
        assert_eq!(created.business_order_id.as_str(), "SF-1009");
    }
}
