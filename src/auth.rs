//! Shared-secret access gate
//!
//! Every gated request must present the configured secret in the
//! `X-API-Key` header. The gate fails closed: when no secret is configured,
//! or the configured secret is empty, nothing is authorized.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Compares presented keys against the configured shared secret
///
/// Only the SHA-256 digest of the secret is kept.
#[derive(Clone)]
pub struct ApiKeyGate {
    secret_hash: Option<Vec<u8>>,
}

impl ApiKeyGate {
    /// Create a gate; an empty secret is treated as no secret at all
    pub fn new(secret: Option<String>) -> Self {
        ApiKeyGate {
            secret_hash: secret
                .filter(|s| !s.is_empty())
                .map(|s| Sha256::digest(s.as_bytes()).to_vec()),
        }
    }

    /// Whether a usable secret is configured
    pub fn is_configured(&self) -> bool {
        self.secret_hash.is_some()
    }

    /// Check the raw bytes of a presented key
    ///
    /// Returns `true` only when a secret is configured and `presented`
    /// matches it exactly. Both sides are hashed to a fixed-length digest and
    /// compared in constant time, so neither the secret nor its length leaks
    /// through timing.
    pub fn authorize(&self, presented: Option<&[u8]>) -> bool {
        match (&self.secret_hash, presented) {
            (Some(expected), Some(key)) => {
                let presented_hash = Sha256::digest(key);
                bool::from(presented_hash.as_slice().ct_eq(expected.as_slice()))
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret itself
        f.debug_struct("ApiKeyGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}
