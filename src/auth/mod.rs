//! Caller authentication: webhook signatures and the internal service key.

mod signature;

use actix_web::HttpRequest;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::config::SERVICE_KEY_HEADER;
use crate::error::{AppError, AppResult};

pub use signature::{
    TIMESTAMP_TOLERANCE_SECS, WEBHOOK_ID_HEADER, WEBHOOK_SIGNATURE_HEADER,
    WEBHOOK_TIMESTAMP_HEADER, WebhookVerifier,
};

/// Shared key for internal callers of the studio API.
///
/// `Debug` prints `[REDACTED]`. With no key configured every request is
/// rejected.
#[derive(Clone)]
pub struct ServiceKey(Option<SecretString>);

impl ServiceKey {
    pub fn new(key: Option<SecretString>) -> Self {
        Self(key)
    }

    /// Constant-time comparison against the configured key.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.0 {
            Some(secret) => secret
                .expose_secret()
                .as_bytes()
                .ct_eq(provided.as_bytes())
                .into(),
            None => false,
        }
    }

    /// Require a matching `X-Service-Key` header.
    pub fn authorize(&self, req: &HttpRequest) -> AppResult<()> {
        let provided = req
            .headers()
            .get(SERVICE_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("Missing {} header", SERVICE_KEY_HEADER))
            })?;

        if self.verify(provided) {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Invalid service key".to_string()))
        }
    }
}

impl std::fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "ServiceKey([REDACTED])"),
            None => write!(f, "ServiceKey(None)"),
        }
    }
}
