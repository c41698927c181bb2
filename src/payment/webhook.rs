//! Stripe webhook signature verification.
//!
//! Stripe signs `"{timestamp}.{payload}"` with HMAC-SHA256 and sends the
//! result in the `Stripe-Signature` header as `t=<timestamp>,v1=<hex>`. During
//! secret rotation the header carries several `v1` entries; any match passes.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Why a signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    #[error("Invalid signature header format")]
    MalformedHeader,

    #[error("Missing timestamp in signature")]
    MissingTimestamp,

    #[error("Missing v1 signature")]
    MissingSignature,

    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("Invalid webhook signature")]
    SignatureMismatch,
}

/// Parsed signature header parts.
#[derive(Debug)]
struct SignatureParts {
    timestamp: i64,
    signatures: Vec<String>,
}

/// Parse the Stripe-Signature header.
fn parse_signature_header(header: &str) -> Result<SignatureParts, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let (key, value) = part.split_once('=').ok_or(WebhookError::MalformedHeader)?;

        match key.trim() {
            "t" => timestamp = value.trim().parse().ok(),
            "v1" => signatures.push(value.trim().to_string()),
            _ => {} // Ignore other schemes (v0 is test-only)
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(WebhookError::MissingSignature);
    }

    Ok(SignatureParts {
        timestamp,
        signatures,
    })
}

/// Compute the hex signature Stripe would send for `payload` at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(signature_bytes(secret, timestamp, payload))
}

fn signature_bytes(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Verify a `Stripe-Signature` header against the current time.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<(), WebhookError> {
    verify_signature_at(payload, header, secret, tolerance, unix_now())
}

/// Verify a `Stripe-Signature` header as of `now` (unix seconds).
pub fn verify_signature_at(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<(), WebhookError> {
    let parts = parse_signature_header(header)?;

    let age = now.saturating_sub(parts.timestamp).unsigned_abs();
    if age > tolerance.as_secs() {
        return Err(WebhookError::TimestampOutOfTolerance);
    }

    let expected = signature_bytes(secret, parts.timestamp, payload);

    // Constant-time comparison against every candidate
    let matched = parts
        .signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|provided| expected.ct_eq(&provided).unwrap_u8() == 1);

    if matched {
        Ok(())
    } else {
        Err(WebhookError::SignatureMismatch)
    }
}
