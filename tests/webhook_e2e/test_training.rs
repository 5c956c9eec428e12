//! E2E tests: training completion.

use headshot_studio_lib::models::Plan;
use std::collections::HashSet;

use super::test_helpers::*;

fn training_body(version: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "train-1",
        "status": "succeeded",
        "output": { "version": format!("acme/headshots:{}", version) }
    })
}

/// Starter plan → 5 distinct predictions, 1 email.
#[actix_rt::test]
async fn test_starter_training_dispatches_five_predictions() {
    let h = Harness::start().await;
    let app = h.app().await;
    let studio = h.db.seed_studio(Plan::Starter);

    let (status, body) = post_signed(
        &app,
        &h.verifier(),
        &h.webhook_uri(&studio, "training"),
        &training_body("v7"),
    )
    .await;

    assert_eq!(status, 200, "unexpected body: {}", body);
    assert_eq!(body["success"], true);

    let predictions = h.provider.predictions.lock().unwrap();
    assert_eq!(predictions.len(), 5);
    let prompts: HashSet<_> = predictions.iter().map(|p| p.prompt.clone()).collect();
    assert_eq!(prompts.len(), 5, "prompts must be distinct");
    assert!(predictions.iter().all(|p| p.version == "v7"));
    assert!(predictions.iter().all(|p| p.prompt.contains("ohwx man in his 40s")));
    assert!(predictions[0].webhook.starts_with(
        "https://studio.example.com/api/v1/webhooks/studio?"
    ));
    assert!(predictions[0].webhook.contains("event=prediction"));

    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "owner@example.com");
    assert!(sent[0]
        .html_body
        .contains(&format!("/dashboard/studio/{}", studio.id)));

    assert_eq!(*h.db.dispatched.lock().unwrap(), vec![(studio.id, 5)]);
}

/// The provider's training id also identifies the studio.
#[actix_rt::test]
async fn test_training_found_by_provider_id() {
    let h = Harness::start().await;
    let app = h.app().await;
    let studio = h.db.seed_studio(Plan::Professional);
    let provider_id = studio.provider_id.clone().unwrap();

    let uri = format!(
        "/api/v1/webhooks/studio?user_id={}&user_email=owner%40example.com&event=training",
        studio.creator_user_id
    );
    let mut body = training_body("v8");
    body["id"] = serde_json::Value::String(provider_id);

    let (status, _) = post_signed(&app, &h.verifier(), &uri, &body).await;

    assert_eq!(status, 200);
    assert_eq!(h.provider.predictions.lock().unwrap().len(), 10);
}

/// Studio owned by someone else → 404, nothing dispatched.
#[actix_rt::test]
async fn test_training_for_unknown_studio_not_found() {
    let h = Harness::start().await;
    let app = h.app().await;
    let mut studio = h.db.seed_studio(Plan::Starter);
    studio.creator_user_id = uuid::Uuid::new_v4();

    let (status, _) = post_signed(
        &app,
        &h.verifier(),
        &h.webhook_uri(&studio, "training"),
        &training_body("v7"),
    )
    .await;

    assert_eq!(status, 404);
    assert!(h.provider.predictions.lock().unwrap().is_empty());
    assert!(h.mailer.sent.lock().unwrap().is_empty());
}

/// Missing user_id → 400.
#[actix_rt::test]
async fn test_training_without_user_rejected() {
    let h = Harness::start().await;
    let app = h.app().await;

    let (status, _) = post_signed(
        &app,
        &h.verifier(),
        "/api/v1/webhooks/studio?event=training",
        &training_body("v7"),
    )
    .await;

    assert_eq!(status, 400);
}
