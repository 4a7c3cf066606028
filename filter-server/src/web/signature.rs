//! GitHub webhook signature verification.
//!
//! GitHub signs webhook deliveries with HMAC-SHA256 over the raw request
//! body, sent as `X-Hub-Signature-256: sha256=<hex digest>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm tag prefixed to the hex digest in the signature header.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the tagged signature for a body: `sha256=<hex(HMAC-SHA256(secret, body))>`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Verify a GitHub webhook signature header against the raw body bytes.
///
/// The header value must carry the full tagged form, e.g.
/// `sha256=5112055c05f944f85755efc5f...`. An absent or empty header value
/// fails verification.
///
/// Returns `true` only when the recomputed signature matches the header
/// value under a constant-time comparison.
pub fn verify_signature(secret: &[u8], header_signature: &str, body: &[u8]) -> bool {
    if header_signature.is_empty() {
        warn!("signature_header_missing");
        return false;
    }

    let expected = sign(secret, body);

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(expected.as_bytes(), header_signature.as_bytes());

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = header_signature.len(),
            "signature_mismatch"
        );
    }

    valid
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
