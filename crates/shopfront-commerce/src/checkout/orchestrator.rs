//! Checkout orchestration.
//!
//! Every pipeline has the same shape: validate, price, create the order,
//! then handle the payment method. Network failures never escape as
//! errors; they come back as a [`CheckoutOutcome`] telling the caller
//! what to show and where to go.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cart::BasketSession;
use crate::checkout::{
    mask_phone, user_message, AnalyticsSink, CheckoutForm, CheckoutSaga, CheckoutTotals,
    CommerceApi, CreateOrderRequest, CreatedOrder, DeliveryZone, FormErrors, OrderStatus,
    OrderStatusParams, PaymentApi, PaymentMethod, PaymentSessionRequest, PurchaseEvent,
    StatusItem, TracingAnalytics, GENERIC_ERROR_MESSAGE,
};
use crate::config::BusinessConfig;
use crate::ids::TransactionId;
use crate::recovery::{PendingOrder, RecoveryStore};
use crate::CommerceError;

pub const EMPTY_BASKET_MESSAGE: &str = "আপনার কার্ট খালি";

/// Why a checkout step did not go through.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Checkout form is invalid: {0}")]
    Invalid(FormErrors),

    #[error("Basket is empty")]
    EmptyBasket,

    #[error("Could not price the basket: {0}")]
    Pricing(#[source] CommerceError),

    #[error("Order creation failed: {0}")]
    OrderCreation(#[source] CommerceError),

    #[error("Payment session failed: {0}")]
    PaymentSession(#[source] CommerceError),

    #[error("No order is waiting for payment")]
    NotAwaitingPayment,

    #[error("Order cancellation failed: {0}")]
    Cancel(#[source] CommerceError),
}

impl CheckoutError {
    /// Text for a toast.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Invalid(errors) => errors.to_string(),
            CheckoutError::EmptyBasket => EMPTY_BASKET_MESSAGE.to_string(),
            CheckoutError::OrderCreation(e)
            | CheckoutError::PaymentSession(e)
            | CheckoutError::Cancel(e) => user_message(e),
            CheckoutError::Pricing(_) | CheckoutError::NotAwaitingPayment => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }
}

/// What the checkout page should do next.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Show inline errors and scroll to the top.
    Invalid(FormErrors),
    /// Cash on delivery accepted; navigate to the status page.
    OrderPlaced {
        order: CreatedOrder,
        status_url: String,
    },
    /// Cash on delivery rejected; toast and navigate to the failure page.
    OrderFailed { message: String, status_url: String },
    /// Hard-navigate to the payment gateway.
    RedirectToGateway {
        order: CreatedOrder,
        transaction_id: TransactionId,
        redirect_url: String,
    },
    /// Toast and stay on checkout with the basket intact.
    ///
    /// `saga` is set when an order exists without a payment session, so it
    /// can be retried or cancelled.
    Toast {
        error: CheckoutError,
        saga: Option<CheckoutSaga>,
    },
}

impl CheckoutOutcome {
    pub fn scroll_to_top(&self) -> bool {
        matches!(self, CheckoutOutcome::Invalid(errors) if errors.scroll_to_top())
    }

    pub fn toast(&self) -> Option<String> {
        match self {
            CheckoutOutcome::OrderFailed { message, .. } => Some(message.clone()),
            CheckoutOutcome::Toast { error, .. } => Some(error.user_message()),
            _ => None,
        }
    }

    /// Where the browser goes next, if anywhere.
    pub fn navigate_to(&self) -> Option<&str> {
        match self {
            CheckoutOutcome::OrderPlaced { status_url, .. }
            | CheckoutOutcome::OrderFailed { status_url, .. } => Some(status_url),
            CheckoutOutcome::RedirectToGateway { redirect_url, .. } => Some(redirect_url),
            CheckoutOutcome::Invalid(_) | CheckoutOutcome::Toast { .. } => None,
        }
    }

    fn toast_error(error: CheckoutError) -> Self {
        CheckoutOutcome::Toast { error, saga: None }
    }
}

/// Drives checkout against the external APIs.
///
/// Collaborators are injected; nothing here is global.
pub struct CheckoutOrchestrator {
    commerce: Arc<dyn CommerceApi>,
    payments: Arc<dyn PaymentApi>,
    analytics: Arc<dyn AnalyticsSink>,
    recovery: RecoveryStore,
    config: BusinessConfig,
}

impl CheckoutOrchestrator {
    pub fn new(
        commerce: Arc<dyn CommerceApi>,
        payments: Arc<dyn PaymentApi>,
        recovery: RecoveryStore,
        config: BusinessConfig,
    ) -> Self {
        Self {
            commerce,
            payments,
            analytics: Arc::new(TracingAnalytics),
            recovery,
            config,
        }
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn config(&self) -> &BusinessConfig {
        &self.config
    }

    pub fn recovery(&self) -> &RecoveryStore {
        &self.recovery
    }

    /// Price the active basket for a zone and method.
    pub fn quote(
        &self,
        session: &BasketSession,
        zone: Option<DeliveryZone>,
        method: PaymentMethod,
    ) -> Result<CheckoutTotals, CommerceError> {
        let subtotal = session.subtotal()?;
        let basket_discount = session.discount();
        CheckoutTotals::compute(&self.config, subtotal, basket_discount, zone, method)
    }

    /// Submit the checkout form.
    ///
    /// Each call is a fresh attempt with a fresh transaction id; submitting
    /// twice creates two orders.
    pub async fn submit(&self, session: &mut BasketSession, form: &CheckoutForm) -> CheckoutOutcome {
        if let Err(errors) = form.validate() {
            debug!(fields = errors.errors.len(), "checkout form rejected");
            return CheckoutOutcome::Invalid(errors);
        }

        let lines = session.checkout_lines();
        if lines.is_empty() {
            return CheckoutOutcome::toast_error(CheckoutError::EmptyBasket);
        }

        let method = form.payment_method;
        let totals = match self.quote(session, form.delivery_zone, method) {
            Ok(totals) => totals,
            Err(e) => return CheckoutOutcome::toast_error(CheckoutError::Pricing(e)),
        };

        let transaction_id = method.is_gateway().then(TransactionId::generate);
        let request = CreateOrderRequest::new(
            form,
            &lines,
            &totals,
            self.config.default_courier,
            session.basket().is_preorder(),
            transaction_id,
        );

        info!(
            method = %method,
            items = lines.len(),
            total = request.total,
            phone = %mask_phone(&form.phone),
            "submitting checkout"
        );

        if let Err(e) = self.recovery.begin_attempt(&request.items, &totals, method) {
            warn!(error = %e, "could not write recovery trail");
        }

        let mut saga = CheckoutSaga::new(request);
        let order = match self.create_order(&mut saga).await {
            Ok(order) => order,
            Err(e) => return self.order_creation_failed(method, e),
        };

        if method.is_gateway() {
            self.open_gateway(saga).await
        } else {
            self.complete_cash_on_delivery(session, saga, order).await
        }
    }

    /// Retry the payment step of a saga whose order already exists.
    pub async fn retry_payment(&self, mut saga: CheckoutSaga) -> CheckoutOutcome {
        if let Err(e) = saga.resume() {
            debug!(error = %e, "retry on a saga that is not awaiting payment");
            return CheckoutOutcome::Toast {
                error: CheckoutError::NotAwaitingPayment,
                saga: Some(saga),
            };
        }
        info!(order_id = ?saga.order().map(|o| o.order_id.as_str()), "retrying payment session");
        self.open_gateway(saga).await
    }

    /// Cancel an order that never got a payment session.
    pub async fn cancel(&self, mut saga: CheckoutSaga) -> Result<CheckoutSaga, CheckoutError> {
        if !saga.is_awaiting_payment() {
            return Err(CheckoutError::NotAwaitingPayment);
        }
        let order = saga.order().cloned().ok_or(CheckoutError::NotAwaitingPayment)?;

        self.commerce
            .cancel_order(&order.order_id)
            .await
            .map_err(|e| CheckoutError::Cancel(e.into()))?;
        saga.cancelled().map_err(CheckoutError::Cancel)?;

        if let Err(e) = self.recovery.clear() {
            warn!(error = %e, "could not clear recovery state");
        }
        info!(order_id = %order.order_id, "cancelled order awaiting payment");
        Ok(saga)
    }

    async fn create_order(&self, saga: &mut CheckoutSaga) -> Result<CreatedOrder, CommerceError> {
        let result = match self.commerce.create_order(&saga.request).await {
            Ok(response) => response.into_created(),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(order) => {
                debug!(order_id = %order.order_id, business_order_id = %order.business_order_id, "order created");
                saga.order_created(order.clone())?;
                Ok(order)
            }
            Err(e) => {
                saga.fail(user_message(&e))?;
                Err(e)
            }
        }
    }

    async fn open_payment_session(&self, saga: &mut CheckoutSaga) -> Result<String, CommerceError> {
        let order = saga
            .order()
            .cloned()
            .ok_or(CommerceError::MissingIdentifier("order id"))?;
        let transaction_id = saga
            .transaction_id()
            .cloned()
            .ok_or(CommerceError::MissingIdentifier("transaction id"))?;

        let request = PaymentSessionRequest {
            order_id: order.order_id,
            business_order_id: order.business_order_id,
            transaction_id,
            payment_method: saga.payment_method(),
            amount: saga.request.total,
            customer_name: saga.request.customer_name.clone(),
            phone: saga.request.phone.clone(),
            items: saga.request.items.clone(),
        };

        let result = match self.payments.create_payment_session(&request).await {
            Ok(response) => response.into_redirect_url(),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(url) => {
                saga.payment_session_opened(url.clone())?;
                Ok(url)
            }
            Err(e) => {
                saga.fail(user_message(&e))?;
                Err(e)
            }
        }
    }

    async fn open_gateway(&self, mut saga: CheckoutSaga) -> CheckoutOutcome {
        let redirect_url = match self.open_payment_session(&mut saga).await {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    error = %e,
                    order_id = ?saga.order().map(|o| o.order_id.as_str()),
                    "payment session failed; order left awaiting payment"
                );
                return CheckoutOutcome::Toast {
                    error: CheckoutError::PaymentSession(e),
                    saga: Some(saga),
                };
            }
        };

        let (Some(order), Some(transaction_id)) =
            (saga.order().cloned(), saga.transaction_id().cloned())
        else {
            return CheckoutOutcome::toast_error(CheckoutError::PaymentSession(
                CommerceError::MissingIdentifier("order id"),
            ));
        };

        let pending = PendingOrder {
            order_id: order.order_id.clone(),
            business_order_id: order.business_order_id.clone(),
            transaction_id: transaction_id.clone(),
            analytics: self.purchase_event(&saga, &order),
            created_at: Utc::now(),
        };
        if let Err(e) = self.recovery.save_pending(&pending) {
            warn!(error = %e, "could not persist pending order");
        }

        info!(
            order_id = %order.order_id,
            transaction_id = %transaction_id,
            method = %saga.payment_method(),
            "redirecting to payment gateway"
        );
        CheckoutOutcome::RedirectToGateway {
            order,
            transaction_id,
            redirect_url,
        }
    }

    async fn complete_cash_on_delivery(
        &self,
        session: &mut BasketSession,
        mut saga: CheckoutSaga,
        order: CreatedOrder,
    ) -> CheckoutOutcome {
        if let Err(e) = saga.complete() {
            return CheckoutOutcome::toast_error(CheckoutError::OrderCreation(e));
        }

        self.analytics
            .purchase(&self.purchase_event(&saga, &order))
            .await;
        session.clear_all();
        if let Err(e) = self.recovery.clear() {
            warn!(error = %e, "could not clear recovery state");
        }

        let status_url = self
            .status_params(&saga, &order)
            .to_url(&self.config.order_status_path);
        info!(
            order_id = %order.order_id,
            business_order_id = %order.business_order_id,
            "cash on delivery order placed"
        );
        CheckoutOutcome::OrderPlaced { order, status_url }
    }

    fn order_creation_failed(&self, method: PaymentMethod, error: CommerceError) -> CheckoutOutcome {
        warn!(error = %error, method = %method, "order creation failed");
        if method.is_gateway() {
            return CheckoutOutcome::toast_error(CheckoutError::OrderCreation(error));
        }
        let message = user_message(&error);
        let status_url =
            OrderStatusParams::failure(message.clone()).to_url(&self.config.order_status_path);
        CheckoutOutcome::OrderFailed {
            message,
            status_url,
        }
    }

    fn purchase_event(&self, saga: &CheckoutSaga, order: &CreatedOrder) -> PurchaseEvent {
        let request = &saga.request;
        PurchaseEvent {
            order_id: order.order_id.clone(),
            business_order_id: order.business_order_id.clone(),
            transaction_id: request.transaction_id.clone(),
            payment_method: request.payment_method,
            currency: self.config.currency,
            customer_name: request.customer_name.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
            items: request.items.clone(),
            subtotal: request.subtotal,
            delivery_charge: request.delivery_charge,
            discount: request.discount,
            total: request.total,
        }
    }

    fn status_params(&self, saga: &CheckoutSaga, order: &CreatedOrder) -> OrderStatusParams {
        let request = &saga.request;
        OrderStatusParams {
            status: OrderStatus::Success,
            order_id: Some(order.order_id.clone()),
            business_order_id: Some(order.business_order_id.clone()),
            transaction_id: request.transaction_id.clone(),
            name: request.customer_name.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
            payment_method: Some(request.payment_method),
            delivery_charge: request.delivery_charge,
            discount: request.discount,
            total: request.total,
            message: None,
            items: request
                .items
                .iter()
                .map(|line| StatusItem {
                    name: line.name.clone(),
                    price: line.price,
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}
