//! Pending-order recovery across the gateway redirect.
//!
//! Before the browser leaves for a payment gateway the orchestrator writes a
//! [`PendingOrder`] and a short trail of the attempt into session storage.
//! When the gateway sends the customer back, [`RecoveryStore::reconcile_return`]
//! reads the return URL, falls back to the stored record for anything the
//! URL leaves out, and either clears everything (success) or keeps the
//! record and reports the server's message (failure).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfront_cache::Cache;

use crate::cart::BasketSession;
use crate::checkout::{
    decode_query, CheckoutTotals, DecodedQuery, OrderLine, OrderStatus, OrderStatusParams,
    PaymentMethod, PurchaseEvent, StatusItem, GENERIC_ERROR_MESSAGE,
};
use crate::ids::{BusinessOrderId, OrderId, TransactionId};
use crate::CommerceError;

pub const PENDING_ORDER_KEY: &str = "pendingOrderData";
pub const LAST_ORDER_PRODUCTS_KEY: &str = "lastOrderProducts";
pub const LAST_ORDER_AMOUNT_KEY: &str = "lastOrderAmount";
pub const LAST_DELIVERY_CHARGE_KEY: &str = "lastDeliveryCharge";
pub const PAYMENT_METHOD_KEY: &str = "paymentMethod";
pub const ADDITIONAL_DISCOUNT_KEY: &str = "additionalDiscount";

/// Every key written for an attempt; all are removed on success.
pub const RECOVERY_KEYS: [&str; 6] = [
    PENDING_ORDER_KEY,
    LAST_ORDER_PRODUCTS_KEY,
    LAST_ORDER_AMOUNT_KEY,
    LAST_DELIVERY_CHARGE_KEY,
    PAYMENT_METHOD_KEY,
    ADDITIONAL_DISCOUNT_KEY,
];

/// An in-flight gateway payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub order_id: OrderId,
    pub business_order_id: BusinessOrderId,
    pub transaction_id: TransactionId,
    pub analytics: PurchaseEvent,
    pub created_at: DateTime<Utc>,
}

/// Result of reconciling a gateway return.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
    /// Paid. Baskets and recovery state are gone.
    Success {
        status: OrderStatusParams,
        /// The stored purchase event, for the caller to report.
        analytics: Option<PurchaseEvent>,
    },
    /// Not paid. The pending record is kept.
    Failure {
        message: String,
        pending: Option<PendingOrder>,
    },
}

/// Session-storage view of the recovery keys.
#[derive(Debug, Clone)]
pub struct RecoveryStore {
    cache: Cache,
}

impl RecoveryStore {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Start a new attempt: drop any previous pending record and write the trail.
    pub fn begin_attempt(
        &self,
        items: &[OrderLine],
        totals: &CheckoutTotals,
        method: PaymentMethod,
    ) -> Result<(), CommerceError> {
        self.cache.delete(PENDING_ORDER_KEY)?;
        self.cache.set(LAST_ORDER_PRODUCTS_KEY, items)?;
        self.cache.set(LAST_ORDER_AMOUNT_KEY, &totals.total.to_decimal())?;
        self.cache
            .set(LAST_DELIVERY_CHARGE_KEY, &totals.delivery_charge.to_decimal())?;
        self.cache.set(PAYMENT_METHOD_KEY, &method)?;
        self.cache
            .set(ADDITIONAL_DISCOUNT_KEY, &totals.discount_amount.to_decimal())?;
        Ok(())
    }

    pub fn save_pending(&self, pending: &PendingOrder) -> Result<(), CommerceError> {
        self.cache.set(PENDING_ORDER_KEY, pending)?;
        Ok(())
    }

    pub fn pending(&self) -> Result<Option<PendingOrder>, CommerceError> {
        Ok(self.cache.get(PENDING_ORDER_KEY)?)
    }

    /// Remove the pending record and the whole trail.
    pub fn clear(&self) -> Result<(), CommerceError> {
        self.cache.delete_all(RECOVERY_KEYS)?;
        Ok(())
    }

    /// Reconcile the query string a gateway returned with.
    ///
    /// Values in the URL win over the stored record.
    pub fn reconcile_return(
        &self,
        query: &str,
        session: &mut BasketSession,
    ) -> Result<ReturnOutcome, CommerceError> {
        let decoded = decode_query(query)?;
        let pending = self.pending()?;

        match decoded.params.status {
            OrderStatus::Success => {
                let status = success_params(&decoded, pending.as_ref())?;
                session.clear_all();
                self.clear()?;
                tracing::info!(
                    order_id = ?status.order_id,
                    transaction_id = ?status.transaction_id,
                    "gateway payment confirmed"
                );
                Ok(ReturnOutcome::Success {
                    status,
                    analytics: pending.map(|p| p.analytics),
                })
            }
            OrderStatus::Failed => {
                let message = decoded
                    .params
                    .message
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
                tracing::warn!(
                    order_id = ?pending.as_ref().map(|p| p.order_id.as_str()),
                    "gateway payment failed"
                );
                Ok(ReturnOutcome::Failure { message, pending })
            }
        }
    }
}

/// URL values first, then the stored purchase event.
fn success_params(
    decoded: &DecodedQuery,
    pending: Option<&PendingOrder>,
) -> Result<OrderStatusParams, CommerceError> {
    let url = &decoded.params;
    let event = pending.map(|p| &p.analytics);
    let or_event = |given: &str, stored: Option<&String>| {
        if given.trim().is_empty() {
            stored.cloned().unwrap_or_default()
        } else {
            given.to_string()
        }
    };

    let total = decoded
        .amount("amount")?
        .or(decoded.amount("total")?)
        .or(event.map(|e| e.total))
        .unwrap_or(0.0);

    let items = if url.items.is_empty() {
        event
            .map(|e| {
                e.items
                    .iter()
                    .map(|line| StatusItem {
                        name: line.name.clone(),
                        price: line.price,
                        quantity: line.quantity,
                    })
                    .collect()
            })
            .unwrap_or_default()
    } else {
        url.items.clone()
    };

    Ok(OrderStatusParams {
        status: OrderStatus::Success,
        order_id: url
            .order_id
            .clone()
            .or_else(|| pending.map(|p| p.order_id.clone())),
        business_order_id: url
            .business_order_id
            .clone()
            .or_else(|| pending.map(|p| p.business_order_id.clone())),
        transaction_id: url
            .transaction_id
            .clone()
            .or_else(|| pending.map(|p| p.transaction_id.clone())),
        name: or_event(&url.name, event.map(|e| &e.customer_name)),
        phone: or_event(&url.phone, event.map(|e| &e.phone)),
        address: or_event(&url.address, event.map(|e| &e.address)),
        payment_method: url.payment_method.or(event.map(|e| e.payment_method)),
        delivery_charge: decoded
            .amount("deliveryCharge")?
            .or(event.map(|e| e.delivery_charge))
            .unwrap_or(0.0),
        discount: decoded
            .amount("discount")?
            .or(event.map(|e| e.discount))
            .unwrap_or(0.0),
        total,
        message: url.message.clone(),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::fixtures::item;
    use crate::cart::BasketAdd;
    use crate::money::{Currency, Money};
    use crate::ids::ProductId;

    fn event() -> PurchaseEvent {
        PurchaseEvent {
            order_id: OrderId::new("o-7"),
            business_order_id: BusinessOrderId::new("SF-1007"),
            transaction_id: Some(TransactionId::new("TXN-1-AAAAAAAA")),
            payment_method: PaymentMethod::Bkash,
            currency: Currency::BDT,
            customer_name: "Karim".into(),
            phone: "01812345678".into(),
            address: "Mirpur 10, Dhaka".into(),
            items: vec![OrderLine {
                product_id: ProductId::new("p1"),
                variant_id: None,
                name: "Tee".into(),
                price: 500.0,
                quantity: 2,
                variant: None,
            }],
            subtotal: 1000.0,
            delivery_charge: 80.0,
            discount: 200.0,
            total: 880.0,
        }
    }

    fn pending() -> PendingOrder {
        PendingOrder {
            order_id: OrderId::new("o-7"),
            business_order_id: BusinessOrderId::new("SF-1007"),
            transaction_id: TransactionId::new("TXN-1-AAAAAAAA"),
            analytics: event(),
            created_at: Utc::now(),
        }
    }

    fn totals() -> CheckoutTotals {
        let taka = |n| Money::from_major(n, Currency::BDT);
        CheckoutTotals {
            subtotal: taka(1000),
            delivery_charge: taka(80),
            discount_amount: taka(200),
            total: taka(880),
            due_amount: taka(880),
        }
    }

    fn store_with_pending() -> RecoveryStore {
        let store = RecoveryStore::new(Cache::memory());
        store
            .begin_attempt(&event().items, &totals(), PaymentMethod::Bkash)
            .unwrap();
        store.save_pending(&pending()).unwrap();
        store
    }

    fn session_with_items() -> BasketSession {
        let mut session = BasketSession::new(Currency::BDT);
        session
            .request_add(BasketAdd::Regular(item("p1", None, 500, 2, 5)))
            .unwrap();
        session
    }

    #[test]
    fn test_begin_attempt_writes_trail_and_supersedes() {
        let store = store_with_pending();
        let cache = store.cache();
        assert_eq!(cache.get::<f64>(LAST_ORDER_AMOUNT_KEY).unwrap(), Some(880.0));
        assert_eq!(
            cache.get::<PaymentMethod>(PAYMENT_METHOD_KEY).unwrap(),
            Some(PaymentMethod::Bkash)
        );

        store
            .begin_attempt(&[], &totals(), PaymentMethod::Nagad)
            .unwrap();
        assert!(store.pending().unwrap().is_none());
    }

    #[test]
    fn test_success_clears_everything() {
        let store = store_with_pending();
        let mut session = session_with_items();

        let outcome = store
            .reconcile_return("?status=success&transactionId=TXN-1-AAAAAAAA", &mut session)
            .unwrap();

        match outcome {
            ReturnOutcome::Success { status, analytics } => {
                assert_eq!(status.order_id, Some(OrderId::new("o-7")));
                assert_eq!(status.total, 880.0);
                assert_eq!(status.subtotal(), 1000.0);
                assert!(analytics.is_some());
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert!(session.basket().is_empty());
        for key in RECOVERY_KEYS {
            assert!(!store.cache().exists(key).unwrap());
        }
    }

    #[test]
    fn test_url_values_win_over_record() {
        let store = store_with_pending();
        let mut session = session_with_items();
        let outcome = store
            .reconcile_return("status=completed&orderId=o-99&amount=900", &mut session)
            .unwrap();
        let ReturnOutcome::Success { status, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(status.order_id, Some(OrderId::new("o-99")));
        assert_eq!(status.business_order_id, Some(BusinessOrderId::new("SF-1007")));
        assert_eq!(status.total, 900.0);
    }

    #[test]
    fn test_success_without_record_uses_url() {
        let store = RecoveryStore::new(Cache::memory());
        let mut session = session_with_items();
        let outcome = store
            .reconcile_return("status=success&orderId=o-3&total=450", &mut session)
            .unwrap();
        let ReturnOutcome::Success { status, analytics } = outcome else {
            panic!("expected success");
        };
        assert_eq!(status.order_id, Some(OrderId::new("o-3")));
        assert_eq!(status.total, 450.0);
        assert!(analytics.is_none());
        assert!(session.basket().is_empty());
    }

    #[test]
    fn test_success_without_record_shows_url_items() {
        let store = RecoveryStore::new(Cache::memory());
        let mut session = session_with_items();
        let outcome = store
            .reconcile_return(
                "status=success&orderId=o-3&total=1080&deliveryCharge=80\
                 &items[0][name]=Tee&items[0][price]=500&items[0][quantity]=2",
                &mut session,
            )
            .unwrap();
        let ReturnOutcome::Success { status, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(status.items.len(), 1);
        assert_eq!(status.items[0].name, "Tee");

        let summary = status.summary();
        assert_eq!(summary.subtotal, 1000.0);
        assert_eq!(summary.delivery_charge, 80.0);
        assert_eq!(summary.total, 1080.0);
    }

    #[test]
    fn test_url_items_replace_stored_items() {
        let store = store_with_pending();
        let mut session = session_with_items();
        let outcome = store
            .reconcile_return(
                "status=success&items[0][name]=Mug&items[0][price]=300&items[0][quantity]=1",
                &mut session,
            )
            .unwrap();
        let ReturnOutcome::Success { status, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(status.subtotal(), 300.0);
        assert_eq!(status.name, "Karim");
        assert_eq!(status.delivery_charge, 80.0);
    }

    #[test]
    fn test_failure_keeps_record_and_message_verbatim() {
        let store = store_with_pending();
        let mut session = session_with_items();

        let outcome = store
            .reconcile_return("status=failed&message=Insufficient+balance", &mut session)
            .unwrap();

        assert_eq!(
            outcome,
            ReturnOutcome::Failure {
                message: "Insufficient balance".to_string(),
                pending: Some(store.pending().unwrap().unwrap()),
            }
        );
        assert!(store.pending().unwrap().is_some());
        assert!(!session.basket().is_empty());
    }

    #[test]
    fn test_failure_without_message_uses_generic() {
        let store = store_with_pending();
        let mut session = session_with_items();
        let outcome = store
            .reconcile_return("status=cancelled", &mut session)
            .unwrap();
        assert!(matches!(
            outcome,
            ReturnOutcome::Failure { ref message, .. } if message == GENERIC_ERROR_MESSAGE
        ));
    }

    #[test]
    fn test_missing_status_is_an_error() {
        let store = store_with_pending();
        let mut session = session_with_items();
        assert!(store.reconcile_return("orderId=o-7", &mut session).is_err());
        assert!(store.pending().unwrap().is_some());
    }
}
