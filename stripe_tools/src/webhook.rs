//! Stripe webhook signature verification.
//!
//! Stripe signs each webhook delivery with a `Stripe-Signature` header of the form
//! `t=<unix ts>,v1=<hex hmac>[,v1=...]`, where the HMAC-SHA256 is taken over `"{t}.{raw body}"` with the
//! endpoint's signing secret. The payload must not be parsed before this check passes.

use std::str::FromStr;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::StripeApiError;

type HmacSha256 = Hmac<Sha256>;

/// Signatures older than this many seconds are rejected to blunt replays.
pub const SIGNATURE_TOLERANCE_SECONDS: i64 = 300;

/// The parsed form of a `Stripe-Signature` header. Multiple `v1` entries are legal while a signing secret is
/// being rotated; any one of them matching is sufficient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

impl FromStr for SignatureHeader {
    type Err = StripeApiError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                return Err(StripeApiError::MalformedSignature(format!("'{part}' is not a key=value pair")));
            };
            match key {
                "t" => {
                    let ts = value
                        .parse::<i64>()
                        .map_err(|e| StripeApiError::MalformedSignature(format!("Invalid timestamp: {e}")))?;
                    timestamp = Some(ts);
                },
                "v1" => signatures.push(value.to_string()),
                // Other schemes (v0 is Stripe's test-mode signature) are ignored.
                _ => {},
            }
        }
        let timestamp =
            timestamp.ok_or_else(|| StripeApiError::MalformedSignature("No timestamp in header".to_string()))?;
        if signatures.is_empty() {
            return Err(StripeApiError::MalformedSignature("No v1 signature in header".to_string()));
        }
        Ok(Self { timestamp, signatures })
    }
}

fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> Result<String, StripeApiError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| StripeApiError::MalformedSignature(e.to_string()))?;
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Computes the hex signature Stripe would attach to `body` at `timestamp`.
pub fn sign_payload(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, StripeApiError> {
    let mut payload = format!("{timestamp}.").into_bytes();
    payload.extend_from_slice(body);
    hmac_sha256_hex(secret.as_bytes(), &payload)
}

/// Verifies `header` against the raw request `body`, taking the current time from the system clock.
pub fn verify_webhook_signature(secret: &str, header: &str, body: &[u8]) -> Result<(), StripeApiError> {
    verify_webhook_signature_at(secret, header, body, chrono::Utc::now().timestamp())
}

/// As [`verify_webhook_signature`], with the clock injected.
pub fn verify_webhook_signature_at(
    secret: &str,
    header: &str,
    body: &[u8],
    now: i64,
) -> Result<(), StripeApiError> {
    let header = SignatureHeader::from_str(header)?;
    if now - header.timestamp > SIGNATURE_TOLERANCE_SECONDS {
        return Err(StripeApiError::StaleTimestamp { timestamp: header.timestamp, now });
    }
    let expected = sign_payload(secret, header.timestamp, body)?;
    if header.signatures.iter().any(|sig| *sig == expected) {
        Ok(())
    } else {
        Err(StripeApiError::InvalidSignature)
    }
}
