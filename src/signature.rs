//! Identity signature verification.
//!
//! Salesforce signs successful token responses so clients can confirm the
//! response came from a party holding the consumer secret: the `signature`
//! field is the base64-encoded HMAC-SHA256 of `id` concatenated with
//! `issued_at`, keyed with the client secret.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected signature for an `id` / `issued_at` pair.
pub fn compute_signature(client_secret: &str, id: &str, issued_at: &str) -> String {
    // HMAC-SHA256 accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(id.as_bytes());
    mac.update(issued_at.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Check a payload's `signature` against the recomputed value.
pub fn verify_signature(
    client_secret: &str,
    id: &str,
    issued_at: &str,
    signature: &str,
) -> bool {
    let expected = compute_signature(client_secret, id, issued_at);
    constant_time_compare(expected.as_bytes(), signature.as_bytes())
}

/// Constant-time byte comparison, so verification time does not leak how much
/// of the signature matched.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
