//! HTTP adapters for the Shopfront checkout.
//!
//! [`HttpCommerceApi`] and [`HttpPaymentApi`] implement the contracts the
//! checkout orchestrator is written against, on top of a small JSON client
//! with per-call timeouts.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_data::{FetchClient, HttpCommerceApi, TimeoutConfig};
//!
//! let client = FetchClient::new("https://api.example.com/v1", TimeoutConfig::default())?;
//! let commerce = HttpCommerceApi::new(client);
//! let response = commerce.create_order(&request).await?;
//! ```

mod api;
mod client;
mod error;
mod response;
mod timeout;

pub use api::{HttpCommerceApi, HttpPaymentApi};
pub use client::FetchClient;
pub use error::FetchError;
pub use response::Response;
pub use timeout::TimeoutConfig;
