//! HMAC-SHA256 signature checks for inbound gateway callbacks.
//!
//! Razorpay signs the raw body and sends a hex digest. Cashfree signs
//! `timestamp + raw body` and sends a base64 digest. Both are checked here
//! against the untouched request bytes; nothing in this module has side effects.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    Hex,
    Base64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureScheme {
    pub encoding: SignatureEncoding,
    /// Whether the vendor prefixes the signed message with its timestamp header.
    pub timestamped: bool,
}

impl SignatureScheme {
    pub const RAZORPAY: SignatureScheme = SignatureScheme {
        encoding: SignatureEncoding::Hex,
        timestamped: false,
    };

    pub const CASHFREE: SignatureScheme = SignatureScheme {
        encoding: SignatureEncoding::Base64,
        timestamped: true,
    };
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("webhook secret is not configured")]
    MissingSecret,

    #[error("signature mismatch")]
    Mismatch,
}

pub fn compute(secret: &str, timestamp: Option<&str>, body: &[u8], encoding: SignatureEncoding) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key of any length");
    if let Some(ts) = timestamp {
        mac.update(ts.as_bytes());
    }
    mac.update(body);
    let digest = mac.finalize().into_bytes();

    match encoding {
        SignatureEncoding::Hex => hex::encode(digest),
        SignatureEncoding::Base64 => base64::engine::general_purpose::STANDARD.encode(digest),
    }
}

/// Verifies `provided` against the digest of `body`. Fails closed when no secret
/// is configured. `timestamp` is required for timestamped schemes.
pub fn verify(
    secret: Option<&str>,
    timestamp: Option<&str>,
    body: &[u8],
    provided: Option<&str>,
    scheme: SignatureScheme,
) -> Result<(), SignatureError> {
    let provided = provided
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingHeader("signature"))?;

    let timestamp = if scheme.timestamped {
        Some(
            timestamp
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(SignatureError::MissingHeader("timestamp"))?,
        )
    } else {
        None
    };

    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingSecret)?;

    let expected = compute(secret, timestamp, body, scheme.encoding);
    let expected_bytes = expected.as_bytes();
    let provided_bytes = provided.as_bytes();

    // digest length is fixed per encoding, so the length check leaks nothing
    if expected_bytes.len() != provided_bytes.len() {
        return Err(SignatureError::Mismatch);
    }
    if bool::from(expected_bytes.ct_eq(provided_bytes)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
