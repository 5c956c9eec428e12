//! E2E tests: studio creation.

use headshot_studio_lib::models::{CreditContext, CreditType, StudioStatus};
use uuid::Uuid;

use super::test_helpers::*;

fn studio_body(plan: &str) -> serde_json::Value {
    serde_json::json!({
        "user_id": Uuid::new_v4(),
        "user_email": "owner@example.com",
        "name": "My headshots",
        "plan": plan,
        "datasets_object_key": "datasets/owner.zip",
        "attributes": {
            "gender": "woman",
            "age": "20s",
            "ethnicity": "Korean",
            "hairStyle": "straight black hair",
            "eyeColor": "brown",
            "glasses": false,
            "backgrounds": ["studio", "nature"]
        }
    })
}

#[actix_rt::test]
async fn test_create_studio_starts_training() {
    let h = Harness::start().await;
    let app = h.app().await;

    let (status, body) = create_studio(&app, Some(TEST_SERVICE_KEY), &studio_body("pro")).await;

    assert_eq!(status, 200, "unexpected body: {}", body);
    assert_eq!(body["success"], true);
    let studio_id: Uuid = body["studio_id"].as_str().unwrap().parse().unwrap();

    let studio = h.db.studio(studio_id).expect("studio stored");
    assert_eq!(studio.status, StudioStatus::Processing);
    assert_eq!(studio.provider_id.as_deref(), Some("train-e2e"));
    assert_eq!(studio.attributes.trigger_word, "ohwx");

    let deductions = h.db.deductions.lock().unwrap();
    assert_eq!(deductions[0].credit_type, CreditType::Pro);
    assert_eq!(deductions[0].context, CreditContext::Personal);

    let trainings = h.provider.trainings.lock().unwrap();
    assert_eq!(
        trainings[0].input_images,
        "https://cdn.example.com/storage/v1/object/public/studios/datasets/owner.zip"
    );
    assert!(trainings[0].webhook.contains("event=training"));
    assert!(trainings[0].webhook.contains(&format!("training_id={}", studio_id)));
}

#[actix_rt::test]
async fn test_missing_service_key_rejected() {
    let h = Harness::start().await;
    let app = h.app().await;

    let (status, _) = create_studio(&app, None, &studio_body("starter")).await;
    assert_eq!(status, 401);

    let (status, _) = create_studio(&app, Some("wrong"), &studio_body("starter")).await;
    assert_eq!(status, 401);
    assert!(h.db.studios.lock().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_insufficient_credits_leaves_no_studio() {
    let h = Harness::with_db(MemoryDb::with_credits(0)).await;
    let app = h.app().await;

    let (status, body) =
        create_studio(&app, Some(TEST_SERVICE_KEY), &studio_body("starter")).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "Insufficient credits");
    assert!(h.db.studios.lock().unwrap().is_empty());
    assert!(h.provider.trainings.lock().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_unknown_plan_rejected() {
    let h = Harness::start().await;
    let app = h.app().await;

    let (status, _) = create_studio(&app, Some(TEST_SERVICE_KEY), &studio_body("diamond")).await;
    assert_eq!(status, 400);
    assert!(h.db.deductions.lock().unwrap().is_empty());
}
