//! Webhook content signatures.
//!
//! The platform signs every callback with HMAC-SHA256 over the raw body,
//! keyed with the account's auth token, and sends the hex digest in the
//! `X-Viber-Content-Signature` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Builds the MAC for `body` keyed with `auth_token`.
fn keyed(auth_token: &str, body: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(auth_token.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    mac
}

/// Computes the hex signature of `body`.
///
/// # Panics
///
/// Never: HMAC pads or hashes keys of any length, so keying
/// `Hmac<Sha256>` cannot fail. [`verify_signature`] relies on the same.
pub fn sign(auth_token: &str, body: &[u8]) -> String {
    hex::encode(keyed(auth_token, body).finalize().into_bytes())
}

/// Checks a signature header value against `body` in constant time.
pub fn verify_signature(auth_token: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    keyed(auth_token, body).verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_signature() {
        let token = "445da6az1s345z78-dazcczb2542zv51a-e0vc5fva17480im9";
        let body = br#"{"event":"webhook","timestamp":1457764197627}"#;

        let sig = sign(token, body);
        assert_eq!(sig.len(), 64);
        assert!(verify_signature(token, body, &sig));
        assert!(verify_signature(token, body, &sig.to_uppercase()));
        assert!(!verify_signature(token, b"tampered", &sig));
        assert!(!verify_signature("other-token", body, &sig));
        assert!(!verify_signature(token, body, "not-hex"));
    }

    #[test]
    fn test_any_token_length_signs() {
        let body = b"{}";
        let long = "k".repeat(200);

        for token in ["", "t", long.as_str()] {
            let sig = sign(token, body);
            assert_eq!(sig.len(), 64);
            assert!(verify_signature(token, body, &sig));
        }
        assert_ne!(sign("", body), sign(&long, body));
    }
}
