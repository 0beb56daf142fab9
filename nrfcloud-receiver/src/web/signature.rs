//! nRF Cloud webhook signature verification.
//!
//! nRF Cloud signs each webhook body with HMAC-SHA256 keyed by the shared
//! secret configured on the webhook, and sends the lowercase hex digest in
//! the `X-NRFCLOUD-SIGNATURE` header.

use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-nrfcloud-signature";

/// Outcome of comparing a received signature with the expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    Valid,
    Mismatch { expected: String },
    InvalidKey,
}

/// Compute the hex-encoded HMAC-SHA256 of `body` keyed by `secret`.
pub fn compute_signature(secret: &str, body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify `received` against the signature of the raw, unparsed `body`.
///
/// The comparison is case-sensitive: an uppercase hex digest does not match.
pub fn verify_signature(secret: &str, body: &[u8], received: &str) -> SignatureCheck {
    let expected = match compute_signature(secret, body) {
        Ok(e) => e,
        Err(_) => {
            warn!("nrfcloud_signature_invalid_key");
            return SignatureCheck::InvalidKey;
        }
    };

    if constant_time_compare(&expected, received) {
        SignatureCheck::Valid
    } else {
        SignatureCheck::Mismatch { expected }
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
