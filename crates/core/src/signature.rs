//! Webhook signature verification.
//!
//! GitHub signs every delivery with HMAC-SHA256 over the exact raw body
//! and sends the hex digest in `X-Hub-Signature-256: sha256=<hex>`.
//! Verification must run on the unmodified bytes: any JSON parse or
//! re-serialization before this step breaks byte-for-byte equality with
//! the signed payload.
//!
//! The digest comparison is constant-time (`Mac::verify_slice`), so the
//! comparison itself leaks no timing information.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a webhook delivery signature.
///
/// Returns `false` when the header is absent, lacks the `sha256=` prefix,
/// is not valid hex, has the wrong digest length, or does not match the
/// HMAC-SHA256 of `raw_body` under `secret`. Pure function, no side
/// effects.
pub fn verify_signature(raw_body: &[u8], signature_header: Option<&str>, secret: &str) -> bool {
    let Some(header) = signature_header else {
        return false;
    };
    if raw_body.is_empty() || header.is_empty() {
        return false;
    }

    let Some(received_hex) = header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    let Ok(received) = hex::decode(received_hex) else {
        return false;
    };

    // Key length is unrestricted for HMAC; new_from_slice cannot fail.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);

    // verify_slice performs a constant-time comparison and rejects
    // length mismatches.
    mac.verify_slice(&received).is_ok()
}

/// Compute the `sha256=<hex>` header value for a body and secret.
///
/// Used by tests and by tooling that replays deliveries.
pub fn sign(raw_body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(raw_body);
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-webhook-secret";
    const BODY: &[u8] = br#"{"ref":"refs/heads/main","after":"abcdef1"}"#;

    #[test]
    fn round_trip_verifies() {
        let header = sign(BODY, SECRET);
        assert!(verify_signature(BODY, Some(&header), SECRET));
    }

    #[test]
    fn any_flipped_signature_bit_fails() {
        let header = sign(BODY, SECRET);
        let hex_part = header.strip_prefix("sha256=").unwrap();
        let mut digest = hex::decode(hex_part).unwrap();

        for byte in 0..digest.len() {
            for bit in 0..8 {
                digest[byte] ^= 1 << bit;
                let tampered = format!("sha256={}", hex::encode(&digest));
                assert!(
                    !verify_signature(BODY, Some(&tampered), SECRET),
                    "bit {bit} of byte {byte} accepted"
                );
                digest[byte] ^= 1 << bit;
            }
        }
    }

    #[test]
    fn wrong_secret_fails() {
        let header = sign(BODY, SECRET);
        assert!(!verify_signature(BODY, Some(&header), "other-secret"));
    }

    #[test]
    fn missing_header_fails() {
        assert!(!verify_signature(BODY, None, SECRET));
        assert!(!verify_signature(BODY, Some(""), SECRET));
    }

    #[test]
    fn missing_prefix_fails() {
        let header = sign(BODY, SECRET);
        let bare = header.strip_prefix("sha256=").unwrap();
        assert!(!verify_signature(BODY, Some(bare), SECRET));
        assert!(!verify_signature(BODY, Some(&format!("sha1={bare}")), SECRET));
    }

    #[test]
    fn non_hex_digest_fails() {
        assert!(!verify_signature(BODY, Some("sha256=zzzz"), SECRET));
    }

    #[test]
    fn truncated_digest_fails() {
        let header = sign(BODY, SECRET);
        assert!(!verify_signature(BODY, Some(&header[..header.len() - 2]), SECRET));
    }

    #[test]
    fn empty_body_fails() {
        let header = sign(b"", SECRET);
        assert!(!verify_signature(b"", Some(&header), SECRET));
    }
}
