//! HMAC-SHA256 payload signing.
//!
//! The signature covers `{timestamp}.{body}` so a captured request cannot be
//! replayed with a fresh timestamp.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{WebhookError, WebhookResult};

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 signature for a webhook payload.
pub fn compute_hmac_signature(secret: &str, timestamp: &str, body: &[u8]) -> WebhookResult<String> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::Internal(format!("HMAC key rejected: {e}")))?;

    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex-encoded signature in constant time.
///
/// Accepts the bare hex digest or the `sha256=` header form.
pub fn verify_hmac_signature(expected: &str, secret: &str, timestamp: &str, body: &[u8]) -> bool {
    let expected = expected.strip_prefix("sha256=").unwrap_or(expected);
    match compute_hmac_signature(secret, timestamp, body) {
        Ok(computed) => constant_time_eq(expected.as_bytes(), computed.as_bytes()),
        Err(_) => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_hex_sha256() {
        let sig = compute_hmac_signature("secret", "1700000000", b"{}").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_accepts_header_form() {
        let body = br#"{"event_type":"crm.engagement.created"}"#;
        let sig = compute_hmac_signature("secret", "1700000000", body).unwrap();

        assert!(verify_hmac_signature(&sig, "secret", "1700000000", body));
        assert!(verify_hmac_signature(&format!("sha256={sig}"), "secret", "1700000000", body));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let body = b"payload";
        let sig = compute_hmac_signature("secret", "1700000000", body).unwrap();

        assert!(!verify_hmac_signature(&sig, "other", "1700000000", body));
        assert!(!verify_hmac_signature(&sig, "secret", "1700000001", body));
        assert!(!verify_hmac_signature(&sig, "secret", "1700000000", b"payload2"));
        assert!(!verify_hmac_signature("", "secret", "1700000000", body));
    }
}
