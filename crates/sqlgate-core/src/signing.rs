//! HMAC-SHA256 payload signing for live sessions.
//!
//! The integrity code over a session's content is an HMAC-SHA256 keyed by the
//! session's author secret, computed over a length-prefixed canonical
//! encoding of the request id and the draft text. Codes are lowercase hex.
//!
//! # Security properties
//!
//! - Verification recomputes the code independently and compares with
//!   constant-time equality (`subtle`), never string `==`.
//! - The canonical message length-prefixes both fields, so no
//!   (id, text) pair can collide with a different split of the same bytes.
//! - A malformed or wrongly-sized submitted code verifies as `false`; it is
//!   a forgery, not a server fault.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlgate_commons::{ExecutionRequestId, GateError, Result};
use subtle::ConstantTimeEq;

use crate::secret::AuthorSecret;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session payloads under per-request author secrets.
///
/// Stateless; construction runs a probe computation so a misconfigured
/// primitive fails at startup (`CryptoUnavailable`) instead of per call.
#[derive(Debug, Clone, Copy)]
pub struct PayloadSigner;

impl PayloadSigner {
    /// Create a signer, verifying the HMAC primitive is usable.
    pub fn new() -> Result<Self> {
        let signer = Self;
        // Startup probe: any failure here is a configuration error.
        signer.compute(
            &ExecutionRequestId::new("probe"),
            "",
            &AuthorSecret::new("probe"),
        )?;
        Ok(signer)
    }

    /// Compute the integrity code for (request id, text) under `secret`.
    ///
    /// Returns lowercase hex of the HMAC-SHA256 output.
    pub fn sign(
        &self,
        request_id: &ExecutionRequestId,
        text: &str,
        secret: &AuthorSecret,
    ) -> Result<String> {
        let mac = self.compute(request_id, text, secret)?;
        Ok(hex::encode(mac))
    }

    /// Independently recompute the code and compare against `submitted`.
    ///
    /// Constant-time comparison over the decoded bytes. Submitted codes that
    /// are not valid hex, or decode to the wrong length, are mismatches.
    pub fn verify(
        &self,
        request_id: &ExecutionRequestId,
        text: &str,
        secret: &AuthorSecret,
        submitted: &str,
    ) -> Result<bool> {
        let Ok(submitted_bytes) = hex::decode(submitted) else {
            return Ok(false);
        };
        let expected = self.compute(request_id, text, secret)?;
        Ok(expected.ct_eq(&submitted_bytes).into())
    }

    fn compute(
        &self,
        request_id: &ExecutionRequestId,
        text: &str,
        secret: &AuthorSecret,
    ) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| GateError::CryptoUnavailable(e.to_string()))?;
        mac.update(&canonical_message(request_id, text));
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Length-prefixed canonical encoding of the signed message:
/// `u64-be(len(id)) || id || u64-be(len(text)) || text`.
///
/// The prefixes make field boundaries unambiguous — ("12", "3x") and
/// ("1", "23x") hash differently even though their concatenations match.
fn canonical_message(request_id: &ExecutionRequestId, text: &str) -> Vec<u8> {
    let id = request_id.as_bytes();
    let text = text.as_bytes();
    let mut msg = Vec::with_capacity(16 + id.len() + text.len());
    msg.extend_from_slice(&(id.len() as u64).to_be_bytes());
    msg.extend_from_slice(id);
    msg.extend_from_slice(&(text.len() as u64).to_be_bytes());
    msg.extend_from_slice(text);
    msg
}
