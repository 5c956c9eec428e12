//! Provider webhook dispatcher.
//!
//! A delivery is verified, routed on its `event` query parameter and
//! processed under the configured deadline:
//!
//! - `training`: the studio's model is ready. One prediction is created per
//!   generated prompt, then the owner is emailed.
//! - `prediction`: a batch of generated images. Every image is stored twice
//!   (original and watermarked preview) and the URLs are appended to the
//!   studio.
//!
//! Any error that maps to a 5xx is reported to the error tracker before it
//! is returned.

use std::sync::Arc;
use std::time::Duration;

use actix_web::ResponseError;
use actix_web::http::header::HeaderMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::WebhookVerifier;
use crate::config::Config;
use crate::db::{ImageRepository, StudioRepository};
use crate::error::{AppError, AppResult};
use crate::models::{
    ImageKind, Plan, PredictionPayload, Studio, TrainingPayload, WebhookEvent, WebhookQuery,
};
use crate::services::email::{Mailer, studio_ready_email};
use crate::services::error_tracking::{ErrorContext, ErrorReporter};
use crate::services::pipeline::BatchRunner;
use crate::services::predictions::{PredictionClient, PredictionRequest};
use crate::services::prompts::generate_prompts;
use crate::services::watermark::Watermark;

const ROUTE: &str = "/api/v1/webhooks/studio";

/// What a successful delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    PredictionsDispatched { studio_id: Uuid, count: usize },
    ImagesStored { studio_id: Uuid, stored: usize, failed: usize },
}

/// Collaborators of the dispatcher.
pub struct WebhookDeps {
    pub studios: Arc<dyn StudioRepository>,
    pub images: Arc<dyn ImageRepository>,
    pub predictions: Arc<dyn PredictionClient>,
    pub mailer: Arc<dyn Mailer>,
    pub reporter: Arc<dyn ErrorReporter>,
    pub batch: BatchRunner,
}

pub struct WebhookDispatcher {
    verifier: WebhookVerifier,
    config: Arc<Config>,
    deadline: Duration,
    deps: WebhookDeps,
}

impl WebhookDispatcher {
    pub fn new(verifier: WebhookVerifier, config: Arc<Config>, deps: WebhookDeps) -> Self {
        Self {
            verifier,
            deadline: config.pipeline.deadline,
            config,
            deps,
        }
    }

    /// Verify and process one delivery.
    pub async fn handle(
        &self,
        query: &WebhookQuery,
        headers: &HeaderMap,
        body: &[u8],
    ) -> AppResult<WebhookOutcome> {
        self.verifier.verify(headers, body)?;

        let event = query
            .event()
            .ok_or_else(|| AppError::InvalidInput("Invalid event".to_string()))?;

        let result = match tokio::time::timeout(self.deadline, self.dispatch(event, query, body))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} webhook exceeded {}s deadline",
                event.as_str(),
                self.deadline.as_secs()
            ))),
        };

        if let Err(e) = &result {
            if e.status_code().is_server_error() {
                let context = ErrorContext::new(format!("webhook.{}", event.as_str()))
                    .tag("route", ROUTE)
                    .tag("event", event.as_str())
                    .tag("studio_id", query.training_id.as_deref().unwrap_or("-"))
                    .tag("user_id", query.user_id.as_deref().unwrap_or("-"));
                self.deps.reporter.capture(e, &context);
            }
        }

        result
    }

    async fn dispatch(
        &self,
        event: WebhookEvent,
        query: &WebhookQuery,
        body: &[u8],
    ) -> AppResult<WebhookOutcome> {
        match event {
            WebhookEvent::Training => {
                let payload: TrainingPayload = serde_json::from_slice(body)
                    .map_err(|e| AppError::InvalidInput(format!("Invalid training payload: {}", e)))?;
                self.on_training(query, &payload).await
            }
            WebhookEvent::Prediction => {
                let payload: PredictionPayload = serde_json::from_slice(body).map_err(|e| {
                    AppError::InvalidInput(format!("Invalid prediction payload: {}", e))
                })?;
                self.on_prediction(query, &payload).await
            }
        }
    }

    async fn load_studio(&self, reference: &str, user_id: &str) -> AppResult<Studio> {
        let owner = Uuid::parse_str(user_id)
            .map_err(|_| AppError::InvalidInput("user_id must be a UUID".to_string()))?;

        self.deps
            .studios
            .find_for_owner(reference, owner)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Studio {}", reference)))
    }

    async fn on_training(
        &self,
        query: &WebhookQuery,
        payload: &TrainingPayload,
    ) -> AppResult<WebhookOutcome> {
        let user_id = query.require_user_id()?;
        let version = payload.version_id()?;
        let reference = query
            .training_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(&payload.id);

        let studio = self.load_studio(reference, user_id).await?;

        let plan = match query.plan.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(raw) => Plan::parse(raw)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown plan: {}", raw)))?,
            None => studio.plan,
        };

        let prompts = generate_prompts(&studio.attributes, plan.prompt_count());
        if prompts.is_empty() {
            return Err(AppError::Internal("No prompts generated".to_string()));
        }

        let studio_id = studio.id.to_string();
        let user_email = query.user_email.as_deref().unwrap_or_default();
        let callback = self.config.webhook_callback_url(
            user_id,
            user_email,
            WebhookEvent::Prediction.as_str(),
            Some(&studio_id),
            None,
        );

        for (index, prompt) in prompts.iter().enumerate() {
            let request = PredictionRequest {
                version: version.to_string(),
                prompt: prompt.clone(),
                webhook: callback.clone(),
            };
            let prediction_id = self.deps.predictions.create_prediction(&request).await?;
            info!(
                studio_id = %studio.id,
                prediction_id = %prediction_id,
                index,
                "Prediction dispatched"
            );
        }

        let count = prompts.len();
        self.deps
            .studios
            .record_predictions_dispatched(studio.id, count as i32)
            .await?;
        info!(studio_id = %studio.id, plan = %plan, predictions_dispatched = count, "Training handled");

        self.notify_owner(query, &studio).await;

        Ok(WebhookOutcome::PredictionsDispatched {
            studio_id: studio.id,
            count,
        })
    }

    /// Email failures are reported but never fail the delivery.
    async fn notify_owner(&self, query: &WebhookQuery, studio: &Studio) {
        let Some(to) = query.user_email.as_deref().filter(|e| !e.trim().is_empty()) else {
            warn!(studio_id = %studio.id, "No user_email on training webhook; skipping email");
            return;
        };

        let message = studio_ready_email(to, &self.config.app_url, &studio.id.to_string());
        if let Err(e) = self.deps.mailer.send(&message).await {
            let context = ErrorContext::new("webhook.training.email")
                .tag("route", ROUTE)
                .tag("studio_id", studio.id.to_string());
            self.deps.reporter.capture(&e, &context);
        }
    }

    async fn on_prediction(
        &self,
        query: &WebhookQuery,
        payload: &PredictionPayload,
    ) -> AppResult<WebhookOutcome> {
        let urls = payload.image_urls()?;
        let user_id = query.require_user_id()?;
        let training_id = query.require_training_id()?;
        let studio = self.load_studio(training_id, user_id).await?;

        let logo = self
            .deps
            .batch
            .source()
            .fetch_bytes(&self.config.pipeline.logo_url)
            .await?;
        let watermark = Watermark::from_bytes(&logo)?;

        let job_id = studio.id.to_string();
        let outcome = self.deps.batch.run(&job_id, &urls, &watermark).await;

        if outcome.is_total_failure() {
            let first = outcome
                .failures
                .first()
                .map(|f| f.error.as_str())
                .unwrap_or("unknown error");
            return Err(AppError::Upstream(format!(
                "All {} images failed; first error: {}",
                outcome.attempted(),
                first
            )));
        }

        self.deps
            .images
            .append_images(
                studio.creator_user_id,
                studio.id,
                ImageKind::Previews,
                &outcome.watermarked,
            )
            .await?;
        self.deps
            .images
            .append_images(
                studio.creator_user_id,
                studio.id,
                ImageKind::Results,
                &outcome.originals,
            )
            .await?;

        info!(
            studio_id = %studio.id,
            stored = outcome.succeeded(),
            failed = outcome.failures.len(),
            "Prediction handled"
        );

        Ok(WebhookOutcome::ImagesStored {
            studio_id: studio.id,
            stored: outcome.succeeded(),
            failed: outcome.failures.len(),
        })
    }
}
