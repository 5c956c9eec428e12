//! AI provider (Replicate) client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ProviderSettings;
use crate::error::{AppError, AppResult};

const WEBHOOK_EVENTS: [&str; 1] = ["completed"];

/// One image-generation request against a trained model.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    /// Version hash of the trained model
    pub version: String,
    pub prompt: String,
    pub webhook: String,
}

/// Fine-tuning request for a new studio.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRequest {
    /// URL of the zipped dataset
    pub input_images: String,
    pub trigger_word: String,
    pub webhook: String,
}

#[async_trait]
pub trait PredictionClient: Send + Sync {
    /// Create a prediction; returns the provider's prediction ID.
    async fn create_prediction(&self, request: &PredictionRequest) -> AppResult<String>;

    /// Start a training; returns the provider's training ID.
    async fn create_training(&self, request: &TrainingRequest) -> AppResult<String>;
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    model: &'static str,
    prompt: &'a str,
    lora_scale: f32,
    num_outputs: u32,
    aspect_ratio: &'static str,
    output_format: &'static str,
    guidance_scale: f32,
    output_quality: u32,
    prompt_strength: f32,
    num_inference_steps: u32,
}

#[derive(Debug, Serialize)]
struct PredictionBody<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
    webhook: &'a str,
    webhook_events_filter: [&'static str; 1],
}

impl<'a> PredictionBody<'a> {
    fn new(request: &'a PredictionRequest) -> Self {
        Self {
            version: &request.version,
            input: PredictionInput {
                model: "dev",
                prompt: &request.prompt,
                lora_scale: 1.0,
                num_outputs: crate::models::IMAGES_PER_PREDICTION,
                aspect_ratio: "1:1",
                output_format: "jpg",
                guidance_scale: 3.5,
                output_quality: 100,
                prompt_strength: 0.8,
                num_inference_steps: 40,
            },
            webhook: &request.webhook,
            webhook_events_filter: WEBHOOK_EVENTS,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrainingInput<'a> {
    steps: u32,
    lora_rank: u32,
    optimizer: &'static str,
    batch_size: u32,
    resolution: &'static str,
    autocaption: bool,
    input_images: &'a str,
    trigger_word: &'a str,
    learning_rate: f64,
}

#[derive(Debug, Serialize)]
struct TrainingBody<'a> {
    destination: &'a str,
    input: TrainingInput<'a>,
    webhook: &'a str,
    webhook_events_filter: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: String,
}

/// Replicate HTTP API client.
#[derive(Clone)]
pub struct ReplicateClient {
    client: reqwest::Client,
    api_url: String,
    token: SecretString,
    trainer_version: String,
    destination_model: Option<String>,
}

impl ReplicateClient {
    pub fn new(settings: &ProviderSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.api_token.clone(),
            trainer_version: settings.trainer_version.clone(),
            destination_model: settings.destination_model.clone(),
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> AppResult<String> {
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "provider returned {}: {}",
                status, detail
            )));
        }

        let created: CreatedResource = response.json().await?;
        Ok(created.id)
    }

    /// `owner/model:version` of the trainer, split.
    fn trainer_parts(&self) -> AppResult<(&str, &str, &str)> {
        let (model, version) = self
            .trainer_version
            .split_once(':')
            .ok_or_else(|| AppError::Internal("trainer version must be owner/model:version".into()))?;
        let (owner, name) = model
            .split_once('/')
            .ok_or_else(|| AppError::Internal("trainer version must be owner/model:version".into()))?;
        Ok((owner, name, version))
    }
}

#[async_trait]
impl PredictionClient for ReplicateClient {
    async fn create_prediction(&self, request: &PredictionRequest) -> AppResult<String> {
        let url = format!("{}/v1/predictions", self.api_url);
        let id = self.post(&url, &PredictionBody::new(request)).await?;
        info!(prediction_id = %id, "Prediction created");
        Ok(id)
    }

    async fn create_training(&self, request: &TrainingRequest) -> AppResult<String> {
        let destination = self
            .destination_model
            .as_deref()
            .ok_or_else(|| AppError::Internal("REPLICATE_DESTINATION_MODEL is not set".into()))?;
        let (owner, name, version) = self.trainer_parts()?;
        let url = format!(
            "{}/v1/models/{}/{}/versions/{}/trainings",
            self.api_url, owner, name, version
        );

        let body = TrainingBody {
            destination,
            input: TrainingInput {
                steps: 1000,
                lora_rank: 16,
                optimizer: "adamw8bit",
                batch_size: 1,
                resolution: "512,768,1024",
                autocaption: false,
                input_images: &request.input_images,
                trigger_word: &request.trigger_word,
                learning_rate: 0.0004,
            },
            webhook: &request.webhook,
            webhook_events_filter: WEBHOOK_EVENTS,
        };

        let id = self.post(&url, &body).await?;
        info!(training_id = %id, "Training created");
        Ok(id)
    }
}
