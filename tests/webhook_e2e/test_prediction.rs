//! E2E tests: prediction completion through the image pipeline.

use headshot_studio_lib::models::{ImageKind, Plan};
use regex::Regex;

use super::test_helpers::*;

/// Every image is stored as original and preview, and both collections
/// are appended.
#[actix_rt::test]
async fn test_prediction_stores_and_appends_images() {
    let h = Harness::start().await;
    let app = h.app().await;
    let studio = h.db.seed_studio(Plan::Starter);
    let output: Vec<String> = (1..=4).map(|i| h.cdn.url(&format!("/img/{}.jpg", i))).collect();

    let (status, body) = post_signed(
        &app,
        &h.verifier(),
        &h.webhook_uri(&studio, "prediction"),
        &serde_json::json!({ "id": "pred-1", "output": output }),
    )
    .await;

    assert_eq!(status, 200, "unexpected body: {}", body);

    let key = Regex::new(&format!(
        r"^\d{{4}}-\d{{2}}/{}/(results|previews)/[0-9a-f-]{{36}}\.jpg$",
        studio.id
    ))
    .unwrap();
    let objects = h.store.objects.lock().unwrap();
    assert_eq!(objects.len(), 8);
    assert!(objects.iter().all(|(k, _, ct)| key.is_match(k) && ct == "image/jpeg"));

    let results = h.db.image_urls(studio.id, ImageKind::Results);
    let previews = h.db.image_urls(studio.id, ImageKind::Previews);
    assert_eq!(results.len(), 4);
    assert_eq!(previews.len(), 4);
    assert!(previews[0].starts_with("https://cdn.example.com/storage/v1/object/public/studios/"));
    assert_eq!(h.cdn.hits("/logo.png"), 1);
}

/// A flaky source recovers within the retry budget.
#[actix_rt::test]
async fn test_flaky_image_is_retried() {
    let h = Harness::start().await;
    let app = h.app().await;
    let studio = h.db.seed_studio(Plan::Starter);

    let (status, _) = post_signed(
        &app,
        &h.verifier(),
        &h.webhook_uri(&studio, "prediction"),
        &serde_json::json!({ "output": [h.cdn.url("/flaky/1.jpg")] }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(h.cdn.hits("/flaky/1.jpg"), 3);
    assert_eq!(h.db.image_urls(studio.id, ImageKind::Results).len(), 1);
}

/// One broken image does not sink the batch.
#[actix_rt::test]
async fn test_partial_failure_keeps_successful_images() {
    let h = Harness::start().await;
    let app = h.app().await;
    let studio = h.db.seed_studio(Plan::Starter);

    let (status, _) = post_signed(
        &app,
        &h.verifier(),
        &h.webhook_uri(&studio, "prediction"),
        &serde_json::json!({
            "output": [h.cdn.url("/img/1.jpg"), h.cdn.url("/broken/2.jpg"), h.cdn.url("/img/3.jpg")]
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(h.cdn.hits("/broken/2.jpg"), 3);
    assert_eq!(h.db.image_urls(studio.id, ImageKind::Results).len(), 2);
    assert_eq!(h.db.image_urls(studio.id, ImageKind::Previews).len(), 2);
}

/// Every image failing → 500 so the provider redelivers; nothing appended.
#[actix_rt::test]
async fn test_total_failure_is_server_error() {
    let h = Harness::start().await;
    let app = h.app().await;
    let studio = h.db.seed_studio(Plan::Starter);

    let (status, body) = post_signed(
        &app,
        &h.verifier(),
        &h.webhook_uri(&studio, "prediction"),
        &serde_json::json!({ "output": [h.cdn.url("/broken/1.jpg"), h.cdn.url("/broken/2.jpg")] }),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert!(h.db.images.lock().unwrap().is_empty());
}

/// Empty output → 400 before any fetch.
#[actix_rt::test]
async fn test_empty_output_rejected_without_fetching() {
    let h = Harness::start().await;
    let app = h.app().await;
    let studio = h.db.seed_studio(Plan::Starter);

    for body in [
        serde_json::json!({ "output": [] }),
        serde_json::json!({ "output": null }),
        serde_json::json!({ "status": "succeeded" }),
    ] {
        let (status, response) = post_signed(
            &app,
            &h.verifier(),
            &h.webhook_uri(&studio, "prediction"),
            &body,
        )
        .await;

        assert_eq!(status, 400);
        assert_eq!(response["error"], "No output images found");
    }

    assert_eq!(h.cdn.total_hits(), 0);
    assert!(h.store.objects.lock().unwrap().is_empty());
}
