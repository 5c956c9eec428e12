//! Concurrency-bounded batch image pipeline.
//!
//! Each source URL goes through fetch, original upload, watermark and
//! preview upload while holding one permit of the injected semaphore.
//! Items fail independently; the batch always settles.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ImageKind, ProcessedImage};
use crate::services::fetch::ImageSource;
use crate::services::storage::{JPEG_CONTENT_TYPE, ObjectStore, object_key};
use crate::services::watermark::Watermark;

/// One item that did not make it through the pipeline.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub url: String,
    pub error: String,
}

/// Settled result of a batch.
///
/// `originals` and `watermarked` are parallel and follow submission order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub originals: Vec<String>,
    pub watermarked: Vec<String>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.originals.len()
    }

    pub fn attempted(&self) -> usize {
        self.originals.len() + self.failures.len()
    }

    /// Items were submitted and none succeeded.
    pub fn is_total_failure(&self) -> bool {
        self.attempted() > 0 && self.succeeded() == 0
    }
}

#[derive(Clone)]
pub struct BatchRunner {
    source: Arc<dyn ImageSource>,
    store: Arc<dyn ObjectStore>,
    limiter: Arc<Semaphore>,
}

impl BatchRunner {
    pub fn new(
        source: Arc<dyn ImageSource>,
        store: Arc<dyn ObjectStore>,
        limiter: Arc<Semaphore>,
    ) -> Self {
        Self {
            source,
            store,
            limiter,
        }
    }

    pub fn source(&self) -> &Arc<dyn ImageSource> {
        &self.source
    }

    /// Run every URL through the pipeline and wait for all of them.
    pub async fn run(&self, job_id: &str, urls: &[String], watermark: &Watermark) -> BatchOutcome {
        let tasks = urls
            .iter()
            .map(|url| self.process_one(job_id, url, watermark));
        let results = join_all(tasks).await;

        let mut outcome = BatchOutcome::default();
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(image) => {
                    outcome.originals.push(image.original_url);
                    outcome.watermarked.push(image.watermarked_url);
                }
                Err(e) => {
                    warn!(studio_id = job_id, url = %url, error = %e, "Image failed");
                    outcome.failures.push(BatchFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            studio_id = job_id,
            succeeded = outcome.succeeded(),
            failed = outcome.failures.len(),
            "Batch settled"
        );
        outcome
    }

    async fn process_one(
        &self,
        job_id: &str,
        url: &str,
        watermark: &Watermark,
    ) -> AppResult<ProcessedImage> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| AppError::Internal("pipeline limiter closed".to_string()))?;

        let original = self.source.fetch_bytes(url).await?;

        let original_path = self
            .store
            .put(
                &object_key(Utc::now(), job_id, ImageKind::Results),
                original.clone(),
                JPEG_CONTENT_TYPE,
            )
            .await?;

        let preview = watermark.apply_async(original).await?;
        let preview_path = self
            .store
            .put(
                &object_key(Utc::now(), job_id, ImageKind::Previews),
                preview,
                JPEG_CONTENT_TYPE,
            )
            .await?;

        Ok(ProcessedImage {
            original_url: self.store.public_url(&original_path),
            watermarked_url: self.store.public_url(&preview_path),
        })
    }
}
