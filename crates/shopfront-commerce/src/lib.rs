//! Basket and checkout engine for the Shopfront storefront.
//!
//! - **Catalog**: products, variants and time-windowed offer pricing
//! - **Cart**: the regular cart, the single-slot preorder basket, and the
//!   gate that keeps them apart
//! - **Checkout**: form validation, totals, the order/payment saga and the
//!   order-status encoding
//! - **Recovery**: pending-order state across the payment-gateway redirect
//!
//! # Example
//!
//! ```rust
//! use shopfront_commerce::prelude::*;
//!
//! let mut session = BasketSession::new(Currency::BDT);
//! let tee = Product {
//!     id: ProductId::new("tee"),
//!     name: "Cotton Tee".to_string(),
//!     image: None,
//!     pricing: PriceSource::fixed(Money::from_major(500, Currency::BDT)),
//!     stock: 5,
//!     is_pre_order: false,
//!     category_id: None,
//!     variant_groups: Vec::new(),
//!     variants: Vec::new(),
//! };
//!
//! let item = LineItem::from_catalog(&tee, None, 2, chrono::Utc::now()).unwrap();
//! session.request_add(BasketAdd::Regular(item)).unwrap();
//!
//! let totals = CheckoutTotals::compute(
//!     &BusinessConfig::default(),
//!     session.subtotal().unwrap(),
//!     Money::zero(Currency::BDT),
//!     Some(DeliveryZone::InsideDhaka),
//!     PaymentMethod::CashOnDelivery,
//! )
//! .unwrap();
//! assert_eq!(totals.total, Money::from_major(1080, Currency::BDT));
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod recovery;

pub use config::BusinessConfig;
pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{BusinessConfig, CategoryMeta, CourierMode, DeliveryFees, WalletPromotion};
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::{resolve_price, PriceSource, Product, ProductVariant, ResolvedPrice, VariantGroup};

    // Cart
    pub use crate::cart::{
        AddKind, AddOutcome, Basket, BasketAdd, BasketSession, BasketState, CheckoutLine,
        ConflictKind, ConflictPrompt, LineItem, MergeOutcome, PreorderBasket, PreorderItem,
        RegularCart, Resolution, ResolveOutcome,
    };

    // Checkout
    pub use crate::checkout::{
        AnalyticsSink, ApiError, CheckoutError, CheckoutForm, CheckoutOrchestrator,
        CheckoutOutcome, CheckoutSaga, CheckoutTotals, CommerceApi, DeliveryZone, OrderStatus,
        OrderStatusParams, PaymentApi, PaymentMethod, SagaState,
    };

    // Recovery
    pub use crate::recovery::{PendingOrder, RecoveryStore, ReturnOutcome};
}
