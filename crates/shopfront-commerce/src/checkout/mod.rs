//! Checkout module.
//!
//! Contains the delivery form, totals, the external API contracts, the
//! order/payment saga, the orchestrator and the order-status encoding.

mod analytics;
mod api;
mod form;
mod orchestrator;
mod saga;
mod status;
mod totals;

pub use analytics::{AnalyticsSink, NoopAnalytics, PurchaseEvent, TracingAnalytics};
pub use api::{
    user_message, ApiError, CommerceApi, CreateOrderRequest, CreateOrderResponse, CreatedOrder,
    OrderLine, PaymentApi, PaymentSessionRequest, PaymentSessionResponse, GENERIC_ERROR_MESSAGE,
};
pub use form::{
    is_valid_phone, mask_phone, messages, CheckoutForm, DeliveryZone, FieldError, FormErrors,
    FormField, PaymentMethod, PHONE_PATTERN,
};
pub use orchestrator::{CheckoutError, CheckoutOrchestrator, CheckoutOutcome, EMPTY_BASKET_MESSAGE};
pub use saga::{CheckoutSaga, SagaStage, SagaState};
pub use status::{OrderStatus, OrderStatusParams, StatusItem, StatusSummary};
pub(crate) use status::{decode_query, DecodedQuery};
pub use totals::CheckoutTotals;
