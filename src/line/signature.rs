//! Webhook signature verification.
//!
//! LINE signs the raw request body with HMAC-SHA256 keyed by the channel
//! secret and sends the base64 digest in `x-line-signature`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Why a webhook request was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Missing x-line-signature header")]
    MissingSignature,

    #[error("Signature is not valid base64")]
    MalformedSignature,

    #[error("Signature mismatch")]
    SignatureMismatch,
}

fn mac(secret: &[u8], body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(body);
    mac
}

/// Base64 HMAC-SHA256 of `body`; what LINE puts in the header.
pub fn sign(secret: &str, body: &[u8]) -> String {
    STANDARD.encode(mac(secret.as_bytes(), body).finalize().into_bytes())
}

/// Constant-time check of `header` against the body's signature.
pub fn verify(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), WebhookError> {
    let header = header.ok_or(WebhookError::MissingSignature)?;
    let expected = STANDARD
        .decode(header.trim())
        .map_err(|_| WebhookError::MalformedSignature)?;
    mac(secret.as_bytes(), body)
        .verify_slice(&expected)
        .map_err(|_| WebhookError::SignatureMismatch)
}
