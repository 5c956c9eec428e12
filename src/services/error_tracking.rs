//! Error-tracking sink.
//!
//! Every capture is logged at ERROR with its tags. When a sink URL is
//! configured the event is also queued on a bounded channel and forwarded by
//! a background task; a full queue drops the event instead of blocking the
//! request path.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::AppError;

const QUEUE_CAPACITY: usize = 256;

/// Context attached to a captured error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorContext {
    pub operation: String,
    pub tags: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Receives errors worth tracking outside the logs.
pub trait ErrorReporter: Send + Sync {
    fn capture(&self, error: &AppError, context: &ErrorContext);
}

/// Serialized event handed to providers.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedEvent {
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub code: &'static str,
    pub message: String,
    pub operation: String,
    pub tags: BTreeMap<String, String>,
}

#[async_trait]
pub trait TrackingProvider: Send + Sync {
    async fn send(&self, event: &TrackedEvent) -> Result<(), AppError>;
    fn provider_name(&self) -> &'static str;
}

/// Posts events as JSON to an HTTP endpoint.
pub struct HttpTrackingProvider {
    url: String,
    client: reqwest::Client,
}

impl HttpTrackingProvider {
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl TrackingProvider for HttpTrackingProvider {
    async fn send(&self, event: &TrackedEvent) -> Result<(), AppError> {
        let response = self.client.post(&self.url).json(event).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(AppError::Upstream(format!(
            "error sink returned non-success status: {}",
            response.status()
        )))
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

/// Default reporter: structured log plus optional forwarding.
#[derive(Clone)]
pub struct TrackingReporter {
    environment: String,
    tx: Option<mpsc::Sender<TrackedEvent>>,
}

impl TrackingReporter {
    /// Reporter that only logs.
    pub fn log_only(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            tx: None,
        }
    }

    /// Reporter forwarding to `providers` from a background task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_providers(
        environment: impl Into<String>,
        providers: Vec<Arc<dyn TrackingProvider>>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<TrackedEvent>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for provider in &providers {
                    if let Err(error) = provider.send(&event).await {
                        warn!(
                            provider = provider.provider_name(),
                            error = %error,
                            "Error-tracking provider failed"
                        );
                    }
                }
            }
        });

        Self {
            environment: environment.into(),
            tx: Some(tx),
        }
    }
}

impl ErrorReporter for TrackingReporter {
    fn capture(&self, error: &AppError, context: &ErrorContext) {
        tracing::error!(
            code = error.code(),
            operation = %context.operation,
            tags = ?context.tags,
            "{}",
            error
        );

        let Some(tx) = &self.tx else {
            return;
        };

        let event = TrackedEvent {
            timestamp: Utc::now(),
            environment: self.environment.clone(),
            code: error.code(),
            message: error.to_string(),
            operation: context.operation.clone(),
            tags: context.tags.clone(),
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Error-tracking queue full; dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Error-tracking queue closed; dropping event");
            }
        }
    }
}
