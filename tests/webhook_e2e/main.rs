//! Webhook E2E test suite.
//!
//! Drives the real routes, signature check, retrying fetcher, batch
//! pipeline and watermark against an in-process mock CDN. Persistence,
//! the AI provider, storage and email are in-memory fakes, so no external
//! services are needed.
//!
//! Run with: cargo test --test webhook_e2e

mod mock_cdn;
mod test_helpers;

mod test_prediction;
mod test_studios;
mod test_training;
