//! HTTP implementations of the commerce and payment contracts.

use async_trait::async_trait;
use shopfront_commerce::checkout::{
    ApiError, CommerceApi, CreateOrderRequest, CreateOrderResponse, PaymentApi,
    PaymentSessionRequest, PaymentSessionResponse,
};
use shopfront_commerce::OrderId;
use url::form_urlencoded;

use crate::FetchClient;

/// Commerce API over HTTP.
///
/// `POST /orders` and `POST /orders/{id}/cancel`.
#[derive(Debug, Clone)]
pub struct HttpCommerceApi {
    client: FetchClient,
}

impl HttpCommerceApi {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommerceApi for HttpCommerceApi {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreateOrderResponse, ApiError> {
        tracing::info!(
            method = %request.payment_method,
            items = request.items.len(),
            total = request.total,
            "creating order"
        );
        Ok(self.client.post_json("orders", request).await?)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), ApiError> {
        tracing::info!(%order_id, "cancelling order");
        Ok(self.client.post_empty(&cancel_path(order_id)).await?)
    }
}

/// Payment API over HTTP.
///
/// `POST /payments/{method}/sessions`.
#[derive(Debug, Clone)]
pub struct HttpPaymentApi {
    client: FetchClient,
}

impl HttpPaymentApi {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentApi for HttpPaymentApi {
    async fn create_payment_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSessionResponse, ApiError> {
        tracing::info!(
            order_id = %request.order_id,
            method = %request.payment_method,
            amount = request.amount,
            "opening payment session"
        );
        let path = format!("payments/{}/sessions", request.payment_method.as_str());
        Ok(self.client.post_json(&path, request).await?)
    }
}

fn cancel_path(order_id: &OrderId) -> String {
    let id: String = form_urlencoded::byte_serialize(order_id.as_str().as_bytes()).collect();
    format!("orders/{id}/cancel")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_path_escapes_id() {
        assert_eq!(cancel_path(&OrderId::new("o-1")), "orders/o-1/cancel");
        assert_eq!(cancel_path(&OrderId::new("a/b c")), "orders/a%2Fb+c/cancel");
    }
}
