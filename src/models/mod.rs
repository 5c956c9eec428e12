//! Domain models for the headshot studio server.

pub mod credits;
pub mod image;
pub mod plan;
pub mod studio;
pub mod webhook;

// Re-export commonly used types
pub use credits::{CreditBalance, CreditContext, CreditRpcResult, CreditType};
pub use image::{ImageKind, ProcessedImage};
pub use plan::{IMAGES_PER_PREDICTION, Plan};
pub use studio::{
    BackgroundTheme, CreateStudioRequest, DEFAULT_TRIGGER_WORD, Studio, StudioAttributes,
    StudioStatus,
};
pub use webhook::{PredictionPayload, TrainingPayload, WebhookEvent, WebhookQuery};
