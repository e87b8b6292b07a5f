//! Identifier newtypes.
//!
//! The backend hands out two ids per order: an internal `OrderId` and the
//! customer-facing `BusinessOrderId`. Separate types keep them apart.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque string identifiers; the backend decides their format.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

define_id!(ProductId);
define_id!(VariantId);
define_id!(CategoryId);
define_id!(OrderId);
define_id!(BusinessOrderId);
define_id!(TransactionId);

/// Prefix of client-generated gateway transaction ids.
pub const TRANSACTION_PREFIX: &str = "TXN";

impl TransactionId {
    /// Generate a fresh client-side transaction id.
    ///
    /// Format: `TXN-<unix millis>-<8 uppercase alphanumerics>`. Every
    /// checkout submission gets a new one; nothing deduplicates them.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(|b| (b as char).to_ascii_uppercase())
            .collect();
        Self(format!("{TRANSACTION_PREFIX}-{millis}-{suffix}"))
    }
}
