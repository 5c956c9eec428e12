//! Studio creation: charge a credit, then start training.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{CreditsRepository, Deduction, StudioRepository};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateStudioRequest, CreditContext, Plan, Studio, StudioStatus, WebhookEvent,
};
use crate::services::error_tracking::{ErrorContext, ErrorReporter};
use crate::services::predictions::{PredictionClient, TrainingRequest};
use crate::services::storage::ObjectStore;

/// Credits charged per studio.
const CREDITS_PER_STUDIO: i32 = 1;

#[derive(Debug, Serialize)]
pub struct CreateStudioResponse {
    pub success: bool,
    pub studio_id: Uuid,
    pub message: String,
}

pub struct StudioService {
    config: Arc<Config>,
    studios: Arc<dyn StudioRepository>,
    credits: Arc<dyn CreditsRepository>,
    predictions: Arc<dyn PredictionClient>,
    store: Arc<dyn ObjectStore>,
    reporter: Arc<dyn ErrorReporter>,
}

impl StudioService {
    pub fn new(
        config: Arc<Config>,
        studios: Arc<dyn StudioRepository>,
        credits: Arc<dyn CreditsRepository>,
        predictions: Arc<dyn PredictionClient>,
        store: Arc<dyn ObjectStore>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            config,
            studios,
            credits,
            predictions,
            store,
            reporter,
        }
    }

    /// Public URL of the uploaded training archive.
    fn dataset_url(&self, key: &str) -> String {
        if key.starts_with("http://") || key.starts_with("https://") {
            return key.to_string();
        }
        self.store.public_url(&format!(
            "{}/{}",
            self.config.storage.bucket,
            key.trim_start_matches('/')
        ))
    }

    pub async fn create(&self, request: CreateStudioRequest) -> AppResult<CreateStudioResponse> {
        let plan = Plan::parse(&request.plan)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown plan: {}", request.plan)))?;
        if request.name.trim().is_empty() {
            return Err(AppError::InvalidInput("name is required".to_string()));
        }
        if request.datasets_object_key.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "datasets_object_key is required".to_string(),
            ));
        }

        let studio = Studio {
            id: request.studio_id.unwrap_or_else(Uuid::new_v4),
            creator_user_id: request.user_id,
            organization_id: request.organization_id,
            name: request.name.trim().to_string(),
            plan,
            status: StudioStatus::Processing,
            provider_id: None,
            attributes: request.attributes,
            datasets_object_key: request.datasets_object_key,
            created_at: Utc::now(),
        };
        self.studios.insert_studio(&studio).await?;

        self.charge(&studio).await?;

        let studio_id = studio.id.to_string();
        let training = TrainingRequest {
            input_images: self.dataset_url(&studio.datasets_object_key),
            trigger_word: studio.attributes.trigger_word.clone(),
            webhook: self.config.webhook_callback_url(
                &studio.creator_user_id.to_string(),
                request.user_email.as_deref().unwrap_or_default(),
                WebhookEvent::Training.as_str(),
                Some(&studio_id),
                Some(plan.as_str()),
            ),
        };

        let provider_id = match self.predictions.create_training(&training).await {
            Ok(id) => id,
            Err(e) => {
                let context = ErrorContext::new("studios.create.training")
                    .tag("route", "/api/v1/studios")
                    .tag("studio_id", studio_id.as_str())
                    .tag("user_id", studio.creator_user_id.to_string());
                self.reporter.capture(&e, &context);
                if let Err(mark_err) = self.studios.mark_failed(studio.id, &e.to_string()).await {
                    warn!(studio_id = %studio.id, error = %mark_err, "Failed to mark studio as failed");
                }
                return Err(e);
            }
        };

        self.studios.set_provider_id(studio.id, &provider_id).await?;
        info!(
            studio_id = %studio.id,
            training_id = %provider_id,
            plan = %plan,
            "Studio created and training started"
        );

        Ok(CreateStudioResponse {
            success: true,
            studio_id: studio.id,
            message: "Studio created successfully".to_string(),
        })
    }

    /// Deduct the studio credit; on refusal the studio row is removed.
    async fn charge(&self, studio: &Studio) -> AppResult<()> {
        let context = if studio.organization_id.is_some() {
            CreditContext::Organization
        } else {
            CreditContext::Personal
        };
        let deduction = Deduction {
            user_id: studio.creator_user_id,
            credit_type: studio.plan.credit_type(),
            amount: CREDITS_PER_STUDIO,
            context,
            studio_id: studio.id,
            description: format!("Studio creation: {}", studio.name),
        };

        let refusal = match self.credits.deduct_credits(&deduction).await {
            Ok(result) if result.success => return Ok(()),
            Ok(result) => result
                .error
                .unwrap_or_else(|| "Insufficient credits".to_string()),
            Err(e) => {
                warn!(studio_id = %studio.id, error = %e, "Credit deduction failed");
                format!("Failed to deduct credits: {}", e)
            }
        };

        if let Err(e) = self.studios.delete_studio(studio.id).await {
            warn!(studio_id = %studio.id, error = %e, "Failed to remove uncharged studio");
        }
        Err(AppError::InvalidInput(refusal))
    }
}
