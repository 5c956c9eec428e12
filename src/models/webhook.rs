//! Inbound webhook query and payload shapes.

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Event tag carried in the callback query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEvent {
    Training,
    Prediction,
}

impl WebhookEvent {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "training" => Some(Self::Training),
            "prediction" => Some(Self::Prediction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Prediction => "prediction",
        }
    }
}

/// Query parameters of `POST /webhooks/studio`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookQuery {
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub event: Option<String>,
    pub plan: Option<String>,
    pub training_id: Option<String>,
}

impl WebhookQuery {
    pub fn event(&self) -> Option<WebhookEvent> {
        self.event.as_deref().and_then(WebhookEvent::parse)
    }

    pub fn require_user_id(&self) -> AppResult<&str> {
        non_empty(self.user_id.as_deref())
            .ok_or_else(|| AppError::InvalidInput("user_id is required".to_string()))
    }

    pub fn require_training_id(&self) -> AppResult<&str> {
        non_empty(self.training_id.as_deref())
            .ok_or_else(|| AppError::InvalidInput("training_id is required".to_string()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Body of a completed training.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingPayload {
    pub id: String,
    pub output: TrainingOutput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingOutput {
    /// `owner/model:version`
    pub version: String,
}

impl TrainingPayload {
    /// Version hash of the trained model.
    pub fn version_id(&self) -> AppResult<&str> {
        let version = self.output.version.trim();
        let id = version.rsplit_once(':').map_or(version, |(_, id)| id);
        if id.is_empty() {
            return Err(AppError::InvalidInput(
                "training output has no version".to_string(),
            ));
        }
        Ok(id)
    }
}

/// Body of a completed prediction.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionPayload {
    #[serde(default)]
    pub output: Option<serde_json::Value>,
}

impl PredictionPayload {
    /// Generated image URLs. Missing, non-array or empty output is invalid.
    pub fn image_urls(&self) -> AppResult<Vec<String>> {
        let items = self
            .output
            .as_ref()
            .and_then(|o| o.as_array())
            .ok_or_else(|| AppError::InvalidInput("No output images found".to_string()))?;

        let urls: Vec<String> = items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        if urls.is_empty() {
            return Err(AppError::InvalidInput("No output images found".to_string()));
        }
        Ok(urls)
    }
}
