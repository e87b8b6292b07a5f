//! Typed session-storage layer for the Shopfront basket engine.
//!
//! Mirrors the browser's tab-scoped session storage: a flat string-keyed
//! store holding JSON documents. Values are serialized automatically.
//!
//! # Example
//!
//! ```rust
//! use shopfront_cache::Cache;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Trail {
//!     amount: f64,
//! }
//!
//! let cache = Cache::memory();
//! cache.set("lastOrderAmount", &Trail { amount: 1080.0 }).unwrap();
//!
//! let trail: Option<Trail> = cache.get("lastOrderAmount").unwrap();
//! assert_eq!(trail, Some(Trail { amount: 1080.0 }));
//!
//! cache.delete("lastOrderAmount").unwrap();
//! assert!(!cache.exists("lastOrderAmount").unwrap());
//! ```

mod backend;
mod error;
mod kv;

pub use backend::{Backend, FileBackend, MemoryBackend};
pub use error::CacheError;
pub use kv::Cache;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Backend, Cache, CacheError};
}
