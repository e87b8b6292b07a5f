//! Commerce error types.

use thiserror::Error;

use crate::cart::ConflictKind;
use crate::checkout::ApiError;

/// Errors that can occur in basket and checkout operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Variant not found on the product.
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// Product or variant has no stock to add.
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// The add conflicts with what the basket already holds.
    #[error("Basket conflict: {0}")]
    BasketConflict(ConflictKind),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// The external API rejected or failed a call.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A successful-looking response lacked an expected identifier.
    #[error("Response missing {0}")]
    MissingIdentifier(&'static str),

    /// The checkout saga cannot perform the requested transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// An order-status or gateway-return query string could not be decoded.
    #[error("Invalid status query: {0}")]
    InvalidStatusQuery(String),

    /// Business configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Session storage error.
    #[error("Session storage error: {0}")]
    Storage(#[from] shopfront_cache::CacheError),
}
