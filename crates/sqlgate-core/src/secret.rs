//! Per-request author secrets.
//!
//! An author secret is a high-entropy token minted once when an execution
//! request is created. It is handed to the creating party out-of-band, used
//! as the HMAC key for every edit of that session, and lives exactly as long
//! as the underlying request. It is never broadcast and never serialized.

use std::fmt;

use rand::RngCore;

/// A per-request signing secret.
///
/// Deliberately does not implement `Serialize`, `Deserialize`, or `Display`,
/// and redacts its `Debug` output: the only way the secret crosses a boundary
/// is the explicit `expose()` call at the signing site. The secret is never
/// mutated after creation; verification only reads it.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorSecret(String);

impl AuthorSecret {
    /// Mint a fresh random secret of `len_bytes` bytes, hex-encoded.
    pub fn mint(len_bytes: usize) -> Self {
        let mut buf = vec![0u8; len_bytes];
        rand::thread_rng().fill_bytes(&mut buf);
        Self(hex::encode(buf))
    }

    /// Wrap an existing secret, e.g. one read back from the request store.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret string. Call sites are the signer and the store
    /// adapter; nothing else should touch this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The secret bytes used as HMAC key material.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for AuthorSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorSecret(<redacted>)")
    }
}
