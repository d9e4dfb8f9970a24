//! Webhook signature verification
//!
//! Stripe signs each delivery with an HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` and sends it as `Stripe-Signature:
//! t=<ts>,v1=<hex>`. Verification recomputes the digest and also bounds the
//! timestamp to defeat replay of captured deliveries.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use vitrine_interfaces::BillingError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of a signed payload, in seconds
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Verify a provider signature header against the raw request body.
///
/// Returns `Ok(true)` for a valid, fresh signature, `Ok(false)` for a wrong
/// or stale one, and an error for a malformed header.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, now_unix: i64) -> Result<bool, BillingError> {
    let (timestamp, signature) = parse_header(header)?;

    if (now_unix - timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Ok(false);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| BillingError::InvalidSignature {
        message: format!("invalid webhook secret: {e}"),
    })?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    Ok(constant_time_eq(expected.as_bytes(), signature.as_bytes()))
}

fn parse_header(header: &str) -> Result<(i64, String), BillingError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse::<i64>().ok();
            }
            Some(("v1", value)) => {
                signature = Some(value.to_string());
            }
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(s)) => Ok((t, s)),
        _ => Err(BillingError::InvalidSignature {
            message: "signature header missing t= or v1= component".to_string(),
        }),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.", timestamp).as_bytes());
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature() {
        let payload = b"{\"type\":\"checkout.session.completed\"}";
        let now = 1_700_000_000;
        let header = sign(payload, SECRET, now);
        assert!(verify_signature(payload, &header, SECRET, now).unwrap());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"{}";
        let now = 1_700_000_000;
        let header = sign(payload, "wrong_secret", now);
        assert!(!verify_signature(payload, &header, SECRET, now).unwrap());
    }

    #[test]
    fn test_modified_payload_rejected() {
        let now = 1_700_000_000;
        let header = sign(b"{\"a\":1}", SECRET, now);
        assert!(!verify_signature(b"{\"a\":2}", &header, SECRET, now).unwrap());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let now = 1_700_000_000;
        let header = sign(payload, SECRET, now - 600);
        assert!(!verify_signature(payload, &header, SECRET, now).unwrap());
    }

    #[test]
    fn test_malformed_headers_error() {
        assert!(verify_signature(b"{}", "garbage", SECRET, 0).is_err());
        assert!(verify_signature(b"{}", "t=123", SECRET, 0).is_err());
        assert!(verify_signature(b"{}", "v1=abc", SECRET, 0).is_err());
        assert!(verify_signature(b"{}", "", SECRET, 0).is_err());
    }
}
