//! Webhook signature verification.
//!
//! The provider signs `{webhook-id}.{webhook-timestamp}.{body}` with
//! HMAC-SHA256 keyed by the base64 part of a `whsec_` secret. The
//! `webhook-signature` header carries one or more space-separated
//! `v1,<base64>` entries; any match is accepted.

use actix_web::http::header::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

pub const WEBHOOK_ID_HEADER: &str = "webhook-id";
pub const WEBHOOK_TIMESTAMP_HEADER: &str = "webhook-timestamp";
pub const WEBHOOK_SIGNATURE_HEADER: &str = "webhook-signature";

/// Maximum distance between the signed timestamp and now.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

const SECRET_PREFIX: &str = "whsec_";

/// Verifies signed provider callbacks.
pub struct WebhookVerifier {
    key: SecretSlice<u8>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl WebhookVerifier {
    /// Build from a `whsec_<base64>` secret. The prefix is optional.
    pub fn new(secret: &SecretString) -> AppResult<Self> {
        let encoded = secret.expose_secret().trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| AppError::Internal("webhook secret is not valid base64".to_string()))?;
        if key.is_empty() {
            return Err(AppError::Internal("webhook secret is empty".to_string()));
        }
        Ok(Self {
            key: SecretSlice::from(key),
        })
    }

    fn mac(&self) -> AppResult<HmacSha256> {
        HmacSha256::new_from_slice(self.key.expose_secret())
            .map_err(|e| AppError::Internal(format!("invalid webhook key: {}", e)))
    }

    /// `v1,<base64>` signature for the given message.
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> AppResult<String> {
        let mut mac = self.mac()?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes())))
    }

    /// Check the headers against the raw body using the current time.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> AppResult<()> {
        self.verify_at(headers, body, Utc::now().timestamp())
    }

    fn verify_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> AppResult<()> {
        let id = header(headers, WEBHOOK_ID_HEADER)?;
        let timestamp = header(headers, WEBHOOK_TIMESTAMP_HEADER)?;
        let signatures = header(headers, WEBHOOK_SIGNATURE_HEADER)?;

        let timestamp: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| unauthorized("Invalid webhook timestamp"))?;
        let skew = now.checked_sub(timestamp).map(i64::unsigned_abs);
        if !skew.is_some_and(|skew| skew <= TIMESTAMP_TOLERANCE_SECS.unsigned_abs()) {
            return Err(unauthorized("Webhook timestamp outside tolerance"));
        }

        let expected = self.sign(id, timestamp, body)?;
        let matched = signatures
            .split_whitespace()
            .filter(|candidate| candidate.starts_with("v1,"))
            .any(|candidate| bool::from(candidate.as_bytes().ct_eq(expected.as_bytes())));

        if matched {
            Ok(())
        } else {
            Err(unauthorized("Invalid webhook signature"))
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", name)))
}

fn unauthorized(message: &str) -> AppError {
    AppError::Unauthorized(message.to_string())
}
