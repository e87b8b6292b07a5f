//! Timeout configuration for API calls.
//!
//! Every call carries a total timeout so a hung request ends as
//! [`FetchError::Timeout`](crate::FetchError::Timeout) instead of leaving
//! checkout loading forever.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout.
    #[serde(with = "millis")]
    pub connect: Duration,
    /// Total operation timeout.
    #[serde(with = "millis")]
    pub total: Duration,
}

impl TimeoutConfig {
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: total / 4,
            total,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            total: Duration::from_secs(30),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_total() {
        let t = TimeoutConfig::from_total(Duration::from_secs(8));
        assert_eq!(t.connect, Duration::from_secs(2));
        assert_eq!(t.total, Duration::from_secs(8));
    }

    #[test]
    fn test_serde_in_millis() {
        let json = serde_json::to_string(&TimeoutConfig::default()).unwrap();
        assert_eq!(json, r#"{"connect":5000,"total":30000}"#);
        let back: TimeoutConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TimeoutConfig::default());
    }
}
