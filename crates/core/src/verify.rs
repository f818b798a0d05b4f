//! Inbound webhook verification.
//!
//! Every interaction call must prove it came from the messaging platform:
//! HMAC-SHA256 over `v0:<timestamp>:<body>` with the shared signing secret,
//! compared in constant time, and a 300-second replay window on the
//! timestamp header. There is no bypass switch.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_VERSION: &str = "v0";
pub const REPLAY_WINDOW_SECS: i64 = 300;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("timestamp header is not a unix epoch integer: `{0}`")]
    MalformedTimestamp(String),
    #[error("timestamp is {drift_secs}s away from now, outside the {REPLAY_WINDOW_SECS}s window")]
    StaleTimestamp { drift_secs: i64 },
    #[error("signature header is not `v0=<hex>`")]
    MalformedSignature,
    #[error("signature does not match the request body")]
    Mismatch,
}

#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(signing_secret: &SecretString) -> Self {
        Self { signing_secret: signing_secret.expose_secret().as_bytes().to_vec() }
    }

    pub fn verify(
        &self,
        raw_body: &str,
        signature_header: &str,
        timestamp_header: &str,
    ) -> Result<(), VerifyError> {
        self.verify_at(raw_body, signature_header, timestamp_header, Utc::now())
    }

    /// Same as [`verify`](Self::verify) with an injected clock, so the replay
    /// window is testable without sleeping.
    pub fn verify_at(
        &self,
        raw_body: &str,
        signature_header: &str,
        timestamp_header: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VerifyError> {
        let timestamp: i64 = timestamp_header
            .trim()
            .parse()
            .map_err(|_| VerifyError::MalformedTimestamp(timestamp_header.to_string()))?;

        let drift_secs = (now.timestamp() - timestamp).abs();
        if drift_secs > REPLAY_WINDOW_SECS {
            return Err(VerifyError::StaleTimestamp { drift_secs });
        }

        let provided = signature_header
            .strip_prefix("v0=")
            .and_then(decode_hex)
            .ok_or(VerifyError::MalformedSignature)?;

        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|_| VerifyError::Mismatch)?;
        mac.update(signing_material(timestamp, raw_body).as_bytes());
        mac.verify_slice(&provided).map_err(|_| VerifyError::Mismatch)
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

/// Computes the `v0=<hex>` signature for a body and timestamp. Production
/// peers sign for us; this exists for tests and local tooling.
pub fn sign(secret: &[u8], timestamp: i64, raw_body: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return format!("{SIGNATURE_VERSION}="),
    };
    mac.update(signing_material(timestamp, raw_body).as_bytes());
    format!("{SIGNATURE_VERSION}={}", encode_hex(mac.finalize().into_bytes().as_slice()))
}

fn signing_material(timestamp: i64, raw_body: &str) -> String {
    format!("{SIGNATURE_VERSION}:{timestamp}:{raw_body}")
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(&hex[index..index + 2], 16).ok())
        .collect()
}
