//! Business logic services.

pub mod email;
pub mod error_tracking;
pub mod fetch;
pub mod pipeline;
pub mod predictions;
pub mod prompts;
pub mod storage;
pub mod studios;
pub mod watermark;
pub mod webhook;

pub use email::{Mailer, ZeptoMailer};
pub use error_tracking::{ErrorReporter, HttpTrackingProvider, TrackingReporter};
pub use fetch::{ImageSource, RetryPolicy, RetryingFetcher};
pub use pipeline::BatchRunner;
pub use predictions::{PredictionClient, ReplicateClient};
pub use storage::{ObjectStore, S3Storage};
pub use studios::StudioService;
pub use watermark::Watermark;
pub use webhook::{WebhookDeps, WebhookDispatcher};
