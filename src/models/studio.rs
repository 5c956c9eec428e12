//! Studio (generation job) domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::Plan;

/// Default token the fine-tuned model is trained to recognise.
pub const DEFAULT_TRIGGER_WORD: &str = "ohwx";

/// Lifecycle status of a studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudioStatus {
    PaymentPending,
    Processing,
    Accepted,
    Completed,
    Failed,
}

impl StudioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentPending => "PAYMENT_PENDING",
            Self::Processing => "PROCESSING",
            Self::Accepted => "ACCEPTED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PAYMENT_PENDING" => Some(Self::PaymentPending),
            "PROCESSING" => Some(Self::Processing),
            "ACCEPTED" => Some(Self::Accepted),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Background theme a prompt is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundTheme {
    Studio,
    Office,
    City,
    Nature,
    Bookshelf,
    Gradient,
}

impl BackgroundTheme {
    pub const ALL: [BackgroundTheme; 6] = [
        BackgroundTheme::Studio,
        BackgroundTheme::Office,
        BackgroundTheme::City,
        BackgroundTheme::Nature,
        BackgroundTheme::Bookshelf,
        BackgroundTheme::Gradient,
    ];
}

fn default_trigger_word() -> String {
    DEFAULT_TRIGGER_WORD.to_string()
}

/// Subject attributes captured when the studio was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioAttributes {
    #[serde(default = "default_trigger_word", alias = "trigger_word")]
    pub trigger_word: String,
    pub gender: String,
    pub age: String,
    pub ethnicity: String,
    #[serde(default, alias = "hair_style")]
    pub hair_style: String,
    #[serde(default, alias = "eye_color")]
    pub eye_color: String,
    #[serde(default)]
    pub glasses: bool,
    /// Empty means every theme.
    #[serde(default)]
    pub backgrounds: Vec<BackgroundTheme>,
}

impl StudioAttributes {
    pub fn pronoun(&self) -> &'static str {
        match self.gender.to_lowercase().as_str() {
            "man" | "male" => "his",
            "woman" | "female" => "her",
            _ => "their",
        }
    }

    pub fn is_woman(&self) -> bool {
        matches!(self.gender.to_lowercase().as_str(), "woman" | "female")
    }

    pub fn glasses_text(&self) -> &'static str {
        if self.glasses { ", wearing glasses" } else { "" }
    }
}

/// A studio as stored.
#[derive(Debug, Clone, Serialize)]
pub struct Studio {
    pub id: Uuid,
    pub creator_user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub plan: Plan,
    pub status: StudioStatus,
    pub provider_id: Option<String>,
    pub attributes: StudioAttributes,
    pub datasets_object_key: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a studio.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudioRequest {
    #[serde(default)]
    pub studio_id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub plan: String,
    pub datasets_object_key: String,
    pub attributes: StudioAttributes,
}
