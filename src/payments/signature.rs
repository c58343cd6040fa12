// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Webhook signature verification.
//!
//! The header looks like `t=1700000000,v1=<hex>,v1=<hex>`; each `v1` is an
//! HMAC-SHA256 of `"{t}.{payload}"` keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Webhook secret is not configured")]
    NotConfigured,

    #[error("Missing signature header")]
    MissingHeader,

    #[error("Malformed signature header")]
    Malformed,

    #[error("Signature timestamp outside the tolerance window")]
    Expired,

    #[error("No signatures found matching the expected signature for payload")]
    Mismatch,
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::NotConfigured)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Hex signature for `payload` at `timestamp`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
    Ok(hex::encode(mac_for(secret, timestamp, payload)?.finalize().into_bytes()))
}

/// Check `header` against `payload`. `now` and the tolerance are in unix
/// seconds. Returns the signed timestamp.
pub fn verify_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<i64, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::NotConfigured);
    }
    let header = header.ok_or(SignatureError::MissingHeader)?;

    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value.parse::<i64>().map_err(|_| SignatureError::Malformed)?),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if now.abs_diff(timestamp) > tolerance_secs.max(0).unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    let mac = mac_for(secret, timestamp, payload)?;
    let matched = candidates
        .iter()
        .filter_map(|candidate| hex::decode(candidate).ok())
        .any(|bytes| mac.clone().verify_slice(&bytes).is_ok());

    if matched {
        Ok(timestamp)
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_700_000_000;

    fn header_for(payload: &[u8], timestamp: i64) -> String {
        format!("t={},v1={}", timestamp, compute_signature(SECRET, timestamp, payload).unwrap())
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = header_for(payload, NOW);
        assert_eq!(verify_signature(payload, Some(&header), SECRET, 300, NOW + 10), Ok(NOW));
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let payload = b"{}";
        let header = format!(
            "t={},v1=deadbeef,v0=ignored,v1={}",
            NOW,
            compute_signature(SECRET, NOW, payload).unwrap()
        );
        assert!(verify_signature(payload, Some(&header), SECRET, 300, NOW).is_ok());
    }

    #[test]
    fn rejects_tampered_payload_and_wrong_secret() {
        let header = header_for(b"payload", NOW);
        assert_eq!(
            verify_signature(b"tampered", Some(&header), SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_signature(b"payload", Some(&header), "whsec_other", 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_missing_and_malformed_headers() {
        let header = header_for(b"{}", NOW);
        assert_eq!(
            verify_signature(b"{}", Some(&header), SECRET, 300, NOW + 301),
            Err(SignatureError::Expired)
        );
        assert_eq!(verify_signature(b"{}", None, SECRET, 300, NOW), Err(SignatureError::MissingHeader));
        assert_eq!(
            verify_signature(b"{}", Some("v1=abc"), SECRET, 300, NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature(b"{}", Some("t=soon,v1=abc"), SECRET, 300, NOW),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature(b"{}", Some(&header), "", 300, NOW),
            Err(SignatureError::NotConfigured)
        );
    }

    #[test]
    fn extreme_timestamps_are_expired() {
        let header = format!("t={},v1=abc", i64::MIN);
        assert_eq!(
            verify_signature(b"{}", Some(&header), SECRET, 300, NOW),
            Err(SignatureError::Expired)
        );

        let header = format!("t={},v1=abc", i64::MAX);
        assert_eq!(
            verify_signature(b"{}", Some(&header), SECRET, 300, -NOW),
            Err(SignatureError::Expired)
        );
    }
}
