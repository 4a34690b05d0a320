use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `body`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex HMAC-SHA256 signature over the raw body in constant time.
///
/// A missing or empty secret rejects everything.
pub fn verify_signature(secret: Option<&str>, body: &[u8], signature_hex: &str) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        tracing::warn!("webhook secret is not configured; rejecting");
        return false;
    };
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
