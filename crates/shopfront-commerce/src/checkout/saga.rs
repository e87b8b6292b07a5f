//! Two-phase order + payment-session saga.
//!
//! Creating the order and opening a payment session are separate calls
//! and not transactional. The saga names the gap: after the order exists
//! but the payment session failed, it sits in `Failed` with the order
//! attached, and can be resumed or cancelled from there.

use serde::{Deserialize, Serialize};

use crate::checkout::{CreateOrderRequest, CreatedOrder, PaymentMethod};
use crate::ids::TransactionId;
use crate::CommerceError;

/// Which call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStage {
    CreateOrder,
    OpenPaymentSession,
}

impl SagaStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStage::CreateOrder => "create_order",
            SagaStage::OpenPaymentSession => "open_payment_session",
        }
    }
}

/// Where a checkout attempt stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SagaState {
    Started,
    OrderCreated {
        order: CreatedOrder,
    },
    PaymentSessionOpened {
        order: CreatedOrder,
        redirect_url: String,
    },
    Completed {
        order: CreatedOrder,
    },
    Failed {
        stage: SagaStage,
        order: Option<CreatedOrder>,
        message: String,
    },
    Cancelled {
        order: CreatedOrder,
    },
}

impl SagaState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Started => "started",
            SagaState::OrderCreated { .. } => "order_created",
            SagaState::PaymentSessionOpened { .. } => "payment_session_opened",
            SagaState::Completed { .. } => "completed",
            SagaState::Failed { .. } => "failed",
            SagaState::Cancelled { .. } => "cancelled",
        }
    }
}

/// One checkout attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSaga {
    /// Order payload, kept so the payment step can be retried.
    pub request: CreateOrderRequest,
    state: SagaState,
}

impl CheckoutSaga {
    pub fn new(request: CreateOrderRequest) -> Self {
        Self {
            request,
            state: SagaState::Started,
        }
    }

    pub fn state(&self) -> &SagaState {
        &self.state
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.request.payment_method
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.request.transaction_id.as_ref()
    }

    /// The created order, in any state that has one.
    pub fn order(&self) -> Option<&CreatedOrder> {
        match &self.state {
            SagaState::Started => None,
            SagaState::OrderCreated { order }
            | SagaState::PaymentSessionOpened { order, .. }
            | SagaState::Completed { order }
            | SagaState::Cancelled { order } => Some(order),
            SagaState::Failed { order, .. } => order.as_ref(),
        }
    }

    /// An order exists server-side but has no payment session.
    pub fn is_awaiting_payment(&self) -> bool {
        match &self.state {
            SagaState::OrderCreated { .. } => true,
            SagaState::Failed { stage, order, .. } => {
                *stage == SagaStage::OpenPaymentSession && order.is_some()
            }
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            SagaState::Completed { .. } | SagaState::Cancelled { .. }
        )
    }

    pub fn order_created(&mut self, order: CreatedOrder) -> Result<(), CommerceError> {
        match self.state {
            SagaState::Started => {
                self.state = SagaState::OrderCreated { order };
                Ok(())
            }
            _ => Err(self.invalid("order_created")),
        }
    }

    pub fn payment_session_opened(&mut self, redirect_url: String) -> Result<(), CommerceError> {
        match &self.state {
            SagaState::OrderCreated { order } => {
                self.state = SagaState::PaymentSessionOpened {
                    order: order.clone(),
                    redirect_url,
                };
                Ok(())
            }
            _ => Err(self.invalid("payment_session_opened")),
        }
    }

    /// Cash on delivery completes straight after the order is created.
    pub fn complete(&mut self) -> Result<(), CommerceError> {
        match &self.state {
            SagaState::OrderCreated { order } | SagaState::PaymentSessionOpened { order, .. } => {
                self.state = SagaState::Completed {
                    order: order.clone(),
                };
                Ok(())
            }
            _ => Err(self.invalid("completed")),
        }
    }

    /// Record a failure of the current step.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), CommerceError> {
        let message = message.into();
        match &self.state {
            SagaState::Started => {
                self.state = SagaState::Failed {
                    stage: SagaStage::CreateOrder,
                    order: None,
                    message,
                };
                Ok(())
            }
            SagaState::OrderCreated { order } => {
                self.state = SagaState::Failed {
                    stage: SagaStage::OpenPaymentSession,
                    order: Some(order.clone()),
                    message,
                };
                Ok(())
            }
            _ => Err(self.invalid("failed")),
        }
    }

    /// Return to `OrderCreated` so the payment step can run again.
    pub fn resume(&mut self) -> Result<(), CommerceError> {
        if !self.is_awaiting_payment() {
            return Err(self.invalid("order_created"));
        }
        if let Some(order) = self.order().cloned() {
            self.state = SagaState::OrderCreated { order };
        }
        Ok(())
    }

    /// Mark the awaiting order as cancelled.
    pub fn cancelled(&mut self) -> Result<(), CommerceError> {
        if !self.is_awaiting_payment() {
            return Err(self.invalid("cancelled"));
        }
        if let Some(order) = self.order().cloned() {
            self.state = SagaState::Cancelled { order };
        }
        Ok(())
    }

    fn invalid(&self, to: &str) -> CommerceError {
        CommerceError::InvalidCheckoutTransition {
            from: self.state.as_str().to_string(),
            to: to.to_string(),
        }
    }
}
