//! The persisted credential record.

use serde::{Deserialize, Serialize};

/// A bearer credential as stored on disk and held in memory for one
/// invocation.
///
/// `expires_at` is an absolute epoch-millisecond instant. A record without
/// one is treated as non-expiring by the lifecycle check. Claims beyond the
/// three named fields are carried opaquely so a round trip through the store
/// never drops data another tool put there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    /// Bearer token presented to the service.
    pub access_token: String,

    /// Present only when a refresh-capable flow was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiry instant in epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,

    /// Opaque claims not interpreted beyond expiry.
    #[serde(flatten)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl TokenRecord {
    /// Create a record holding only an access token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            claims: serde_json::Map::new(),
        }
    }

    /// True iff the record has no expiry or the expiry is after `now_ms`.
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now_ms,
            None => true,
        }
    }
}
