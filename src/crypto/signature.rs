// HMAC-SHA256 webhook signatures: hex digest of the raw request body, keyed with the
// shared webhook secret, plus a unix-seconds timestamp checked against a skew window.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default tolerated distance between the sender's timestamp and our clock.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("timestamp header is not a unix timestamp: '{0}'")]
    MalformedTimestamp(String),
    #[error("timestamp is {skew}s away from server time (tolerance {tolerance}s)")]
    StaleTimestamp { skew: u64, tolerance: u64 },
    #[error("signature is not valid hex")]
    MalformedSignature,
    #[error("signature does not match body")]
    Mismatch,
    #[error("webhook secret is empty")]
    EmptySecret,
}

/// Hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn compute_signature(secret: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mac = keyed(secret, body)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks the timestamp window first, then the body signature in constant time.
///
/// `signature` may carry a `sha256=` prefix. `now` is unix seconds.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    signature: &str,
    timestamp: &str,
    now: u64,
    tolerance: u64,
) -> Result<(), SignatureError> {
    let ts = timestamp
        .trim()
        .parse::<u64>()
        .map_err(|_| SignatureError::MalformedTimestamp(timestamp.to_string()))?;
    let skew = now.abs_diff(ts);
    if skew > tolerance {
        return Err(SignatureError::StaleTimestamp { skew, tolerance });
    }

    let sig = signature.trim();
    let sig = sig.strip_prefix("sha256=").unwrap_or(sig);
    let expected = hex::decode(sig).map_err(|_| SignatureError::MalformedSignature)?;

    keyed(secret, body)?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

fn keyed(secret: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }
    // HMAC accepts keys of any length; the error arm is unreachable for Sha256.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::EmptySecret)?;
    mac.update(body);
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"session_id":"abc","status":"Approved","webhook_type":"status.updated"}"#;

    #[test]
    fn accepts_fresh_signed_body() {
        let sig = compute_signature(SECRET, BODY).unwrap();
        assert!(verify_signature(SECRET, BODY, &sig, "1000", 1000, 300).is_ok());
        let prefixed = format!("sha256={}", sig);
        assert!(verify_signature(SECRET, BODY, &prefixed, "1000", 1299, 300).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let sig = compute_signature(SECRET, BODY).unwrap();
        let tampered = br#"{"session_id":"abc","status":"Declined","webhook_type":"status.updated"}"#;
        assert_eq!(
            verify_signature(SECRET, tampered, &sig, "1000", 1000, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn enforces_window_in_both_directions() {
        let sig = compute_signature(SECRET, BODY).unwrap();
        assert_eq!(
            verify_signature(SECRET, BODY, &sig, "1000", 1301, 300),
            Err(SignatureError::StaleTimestamp { skew: 301, tolerance: 300 })
        );
        assert_eq!(
            verify_signature(SECRET, BODY, &sig, "1400", 1000, 300),
            Err(SignatureError::StaleTimestamp { skew: 400, tolerance: 300 })
        );
        assert!(verify_signature(SECRET, BODY, &sig, "1300", 1000, 300).is_ok());
    }

    #[test]
    fn rejects_garbage_headers() {
        assert!(matches!(
            verify_signature(SECRET, BODY, "abc", "yesterday", 1000, 300),
            Err(SignatureError::MalformedTimestamp(_))
        ));
        assert_eq!(
            verify_signature(SECRET, BODY, "not-hex", "1000", 1000, 300),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(compute_signature("", BODY), Err(SignatureError::EmptySecret));
    }
}
