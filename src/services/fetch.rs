//! Retry-wrapped HTTP fetch.
//!
//! One routine, parameterized by [`RetryPolicy`], for every remote resource
//! the pipeline downloads (generated images and the watermark logo).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::services::error_tracking::{ErrorContext, ErrorReporter};

/// Growth of the wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`
    Exponential,
}

impl BackoffStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "exponential" => Some(Self::Exponential),
            _ => None,
        }
    }
}

/// Retry configuration shared by all fetches.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_strategy: BackoffStrategy,
    pub per_attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 300,
            backoff_strategy: BackoffStrategy::Linear,
            per_attempt_timeout_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Wait after the failed 1-based `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let ms = match self.backoff_strategy {
            BackoffStrategy::Linear => self.backoff_base_ms.saturating_mul(attempt as u64),
            BackoffStrategy::Exponential => self
                .backoff_base_ms
                .saturating_mul(1u64 << (attempt - 1).min(32)),
        };
        Duration::from_millis(ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.per_attempt_timeout_ms)
    }
}

/// Source of raw image bytes.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>>;
}

/// HTTP fetcher applying a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryingFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
    reporter: Arc<dyn ErrorReporter>,
}

impl RetryingFetcher {
    pub fn new(policy: RetryPolicy, reporter: Arc<dyn ErrorReporter>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            policy,
            reporter,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// One attempt. Dropping the future on timeout cancels the request.
    async fn attempt(&self, url: &str) -> AppResult<Vec<u8>> {
        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AppError::Upstream(format!("HTTP {} from {}", status, url)));
            }
            Ok(response.bytes().await?.to_vec())
        };

        match tokio::time::timeout(self.policy.attempt_timeout(), request).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "request to {} exceeded {}ms",
                url, self.policy.per_attempt_timeout_ms
            ))),
        }
    }
}

#[async_trait]
impl ImageSource for RetryingFetcher {
    async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        let attempts = self.policy.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(url).await {
                Ok(bytes) => {
                    debug!(url, attempt, bytes = bytes.len(), "Fetched");
                    return Ok(bytes);
                }
                Err(e) if attempt < attempts => {
                    let wait = self.policy.delay(attempt);
                    warn!(url, attempt, error = %e, wait_ms = wait.as_millis() as u64, "Fetch failed, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    self.reporter.capture(
                        &e,
                        &ErrorContext::new("fetch")
                            .tag("url", url)
                            .tag("attempts", attempts.to_string()),
                    );
                    return Err(e);
                }
            }
        }
    }
}
