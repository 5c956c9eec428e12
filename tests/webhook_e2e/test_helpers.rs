//! Shared test helpers for webhook E2E tests.

use actix_web::{App, dev::ServiceResponse, test, web};
use async_trait::async_trait;
use chrono::Utc;
use headshot_studio_lib::auth::{ServiceKey, WebhookVerifier};
use headshot_studio_lib::config::{
    Config, DatabaseSettings, EmailSettings, Environment, PipelineSettings, ProviderSettings,
    SERVICE_KEY_HEADER, StorageSettings, WebhookSecret,
};
use headshot_studio_lib::db::{
    CreditOwner, CreditsRepository, Deduction, ImageRepository, StudioRepository,
};
use headshot_studio_lib::error::{AppError, AppResult};
use headshot_studio_lib::middleware::RequestLogger;
use headshot_studio_lib::models::{
    BackgroundTheme, CreditBalance, CreditRpcResult, CreditType, ImageKind, Plan, Studio,
    StudioAttributes, StudioStatus,
};
use headshot_studio_lib::services::email::{EmailMessage, Mailer};
use headshot_studio_lib::services::fetch::{BackoffStrategy, RetryPolicy};
use headshot_studio_lib::services::predictions::{
    PredictionClient, PredictionRequest, TrainingRequest,
};
use headshot_studio_lib::services::storage::ObjectStore;
use headshot_studio_lib::services::{
    BatchRunner, RetryingFetcher, StudioService, TrackingReporter, WebhookDeps,
    WebhookDispatcher,
};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::mock_cdn::MockCdn;

pub const TEST_WEBHOOK_SECRET: &str = "whsec_ZTJlLXdlYmhvb2stc2VjcmV0";
pub const TEST_SERVICE_KEY: &str = "e2e-service-key";

/// Config pointing the logo at the mock CDN, with fast retries.
pub fn test_config(cdn: &MockCdn) -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        app_url: "https://studio.example.com".to_string(),
        database: DatabaseSettings {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        storage: StorageSettings {
            endpoint: None,
            bucket: "studios".to_string(),
            region: "us-east-1".to_string(),
            access_key: "unused".to_string(),
            secret_key: SecretString::from("unused"),
            public_url: "https://cdn.example.com".to_string(),
        },
        provider: ProviderSettings {
            api_url: "https://api.replicate.invalid".to_string(),
            api_token: SecretString::from("r8_e2e"),
            webhook_secret: WebhookSecret::Configured(SecretString::from(TEST_WEBHOOK_SECRET)),
            trainer_version: "ostris/flux-dev-lora-trainer:v1".to_string(),
            destination_model: Some("acme/headshots".to_string()),
        },
        email: EmailSettings {
            url: None,
            token: None,
            from_address: "support@example.com".to_string(),
            from_name: "Support".to_string(),
        },
        pipeline: PipelineSettings {
            retry: RetryPolicy {
                max_retries: 3,
                backoff_base_ms: 5,
                backoff_strategy: BackoffStrategy::Linear,
                per_attempt_timeout_ms: 2_000,
            },
            concurrency: 4,
            deadline: Duration::from_secs(20),
            logo_url: cdn.url("/logo.png"),
        },
        service_api_key: Some(SecretString::from(TEST_SERVICE_KEY)),
        error_sink_url: None,
    }
}

pub fn attributes() -> StudioAttributes {
    StudioAttributes {
        trigger_word: "ohwx".to_string(),
        gender: "man".to_string(),
        age: "40s".to_string(),
        ethnicity: "Nigerian".to_string(),
        hair_style: "short curly hair".to_string(),
        eye_color: "dark brown".to_string(),
        glasses: false,
        backgrounds: vec![BackgroundTheme::Studio, BackgroundTheme::City],
    }
}

/// In-memory studios, images and credits.
#[derive(Default)]
pub struct MemoryDb {
    pub studios: Mutex<Vec<Studio>>,
    pub images: Mutex<Vec<(Uuid, ImageKind, String)>>,
    pub deductions: Mutex<Vec<Deduction>>,
    pub dispatched: Mutex<Vec<(Uuid, i32)>>,
    pub credits_available: Mutex<i64>,
}

impl MemoryDb {
    pub fn with_credits(credits: i64) -> Self {
        let db = Self::default();
        *db.credits_available.lock().unwrap() = credits;
        db
    }

    pub fn seed_studio(&self, plan: Plan) -> Studio {
        let studio = Studio {
            id: Uuid::new_v4(),
            creator_user_id: Uuid::new_v4(),
            organization_id: None,
            name: "E2E".to_string(),
            plan,
            status: StudioStatus::Processing,
            provider_id: Some(format!("train-{}", Uuid::new_v4().simple())),
            attributes: attributes(),
            datasets_object_key: "datasets/e2e.zip".to_string(),
            created_at: Utc::now(),
        };
        self.studios.lock().unwrap().push(studio.clone());
        studio
    }

    pub fn image_urls(&self, studio_id: Uuid, kind: ImageKind) -> Vec<String> {
        self.images
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, k, _)| *id == studio_id && *k == kind)
            .map(|(_, _, url)| url.clone())
            .collect()
    }

    pub fn studio(&self, id: Uuid) -> Option<Studio> {
        self.studios
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }
}

#[async_trait]
impl StudioRepository for MemoryDb {
    async fn find_for_owner(&self, reference: &str, owner: Uuid) -> AppResult<Option<Studio>> {
        Ok(self
            .studios
            .lock()
            .unwrap()
            .iter()
            .find(|s| {
                s.creator_user_id == owner
                    && (s.id.to_string() == reference
                        || s.provider_id.as_deref() == Some(reference))
            })
            .cloned())
    }

    async fn insert_studio(&self, studio: &Studio) -> AppResult<()> {
        self.studios.lock().unwrap().push(studio.clone());
        Ok(())
    }

    async fn delete_studio(&self, id: Uuid) -> AppResult<()> {
        self.studios.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }

    async fn set_provider_id(&self, id: Uuid, provider_id: &str) -> AppResult<()> {
        for studio in self.studios.lock().unwrap().iter_mut() {
            if studio.id == id {
                studio.provider_id = Some(provider_id.to_string());
            }
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, _error: &str) -> AppResult<()> {
        for studio in self.studios.lock().unwrap().iter_mut() {
            if studio.id == id {
                studio.status = StudioStatus::Failed;
            }
        }
        Ok(())
    }

    async fn record_predictions_dispatched(&self, id: Uuid, count: i32) -> AppResult<()> {
        self.dispatched.lock().unwrap().push((id, count));
        Ok(())
    }
}

#[async_trait]
impl ImageRepository for MemoryDb {
    async fn append_images(
        &self,
        _user_id: Uuid,
        studio_id: Uuid,
        kind: ImageKind,
        urls: &[String],
    ) -> AppResult<u64> {
        let mut images = self.images.lock().unwrap();
        for url in urls {
            images.push((studio_id, kind, url.clone()));
        }
        Ok(urls.len() as u64)
    }

    async fn list_images(&self, studio_id: Uuid, kind: ImageKind) -> AppResult<Vec<String>> {
        Ok(self.image_urls(studio_id, kind))
    }
}

#[async_trait]
impl CreditsRepository for MemoryDb {
    async fn deduct_credits(&self, deduction: &Deduction) -> AppResult<CreditRpcResult> {
        self.deductions.lock().unwrap().push(deduction.clone());
        let mut available = self.credits_available.lock().unwrap();
        if *available < deduction.amount as i64 {
            return Ok(CreditRpcResult {
                success: false,
                error: Some("Insufficient credits".to_string()),
            });
        }
        *available -= deduction.amount as i64;
        Ok(CreditRpcResult {
            success: true,
            error: None,
        })
    }

    async fn transfer_team_credits_to_member(
        &self,
        _organization_id: Uuid,
        _member_id: Uuid,
        _credit_type: CreditType,
        _amount: i32,
    ) -> AppResult<CreditRpcResult> {
        Ok(CreditRpcResult {
            success: true,
            error: None,
        })
    }

    async fn balance(&self, _owner: CreditOwner) -> AppResult<CreditBalance> {
        Ok(CreditBalance::default())
    }
}

/// Records every call to the AI provider.
#[derive(Default)]
pub struct RecordingProvider {
    pub predictions: Mutex<Vec<PredictionRequest>>,
    pub trainings: Mutex<Vec<TrainingRequest>>,
}

#[async_trait]
impl PredictionClient for RecordingProvider {
    async fn create_prediction(&self, request: &PredictionRequest) -> AppResult<String> {
        let mut predictions = self.predictions.lock().unwrap();
        predictions.push(request.clone());
        Ok(format!("pred-{}", predictions.len()))
    }

    async fn create_training(&self, request: &TrainingRequest) -> AppResult<String> {
        self.trainings.lock().unwrap().push(request.clone());
        Ok("train-e2e".to_string())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Object store keeping uploads in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<Vec<(String, Vec<u8>, String)>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> AppResult<String> {
        if data.is_empty() {
            return Err(AppError::Storage("empty upload".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), data, content_type.to_string()));
        Ok(format!("studios/{}", key))
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.example.com/storage/v1/object/public/{}", path)
    }
}

/// Every fake behind a test app, for assertions.
pub struct Harness {
    pub cdn: MockCdn,
    pub config: Arc<Config>,
    pub db: Arc<MemoryDb>,
    pub provider: Arc<RecordingProvider>,
    pub mailer: Arc<RecordingMailer>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::with_db(MemoryDb::with_credits(10)).await
    }

    pub async fn with_db(db: MemoryDb) -> Self {
        let cdn = MockCdn::start().await;
        let config = Arc::new(test_config(&cdn));
        Self {
            cdn,
            config,
            db: Arc::new(db),
            provider: Arc::new(RecordingProvider::default()),
            mailer: Arc::new(RecordingMailer::default()),
            store: Arc::new(MemoryStore::default()),
        }
    }

    pub fn verifier(&self) -> WebhookVerifier {
        WebhookVerifier::new(&SecretString::from(TEST_WEBHOOK_SECRET))
            .expect("valid test secret")
    }

    /// Test app wired the way `main` wires the server.
    pub async fn app(
        &self,
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    > {
        let reporter = Arc::new(TrackingReporter::log_only("test"));
        let fetcher = RetryingFetcher::new(self.config.pipeline.retry.clone(), reporter.clone())
            .expect("fetcher");
        let batch = BatchRunner::new(
            Arc::new(fetcher),
            self.store.clone(),
            Arc::new(Semaphore::new(self.config.pipeline.concurrency)),
        );

        let dispatcher = WebhookDispatcher::new(
            self.verifier(),
            self.config.clone(),
            WebhookDeps {
                studios: self.db.clone(),
                images: self.db.clone(),
                predictions: self.provider.clone(),
                mailer: self.mailer.clone(),
                reporter: reporter.clone(),
                batch,
            },
        );
        let studios = StudioService::new(
            self.config.clone(),
            self.db.clone(),
            self.db.clone(),
            self.provider.clone(),
            self.store.clone(),
            reporter,
        );
        let service_key = ServiceKey::new(self.config.service_api_key.clone());

        test::init_service(
            App::new()
                .wrap(RequestLogger)
                .app_data(web::Data::new(dispatcher))
                .app_data(web::Data::new(studios))
                .app_data(web::Data::new(service_key))
                .service(
                    web::scope("/api/v1")
                        .configure(headshot_studio_lib::api::configure_webhook_routes)
                        .configure(headshot_studio_lib::api::configure_studio_routes),
                ),
        )
        .await
    }

    /// Webhook query string for a studio.
    pub fn webhook_uri(&self, studio: &Studio, event: &str) -> String {
        format!(
            "/api/v1/webhooks/studio?user_id={}&user_email=owner%40example.com&event={}&training_id={}",
            studio.creator_user_id, event, studio.id
        )
    }
}

/// POST a webhook signed with `verifier`.
pub async fn post_signed<S>(
    app: &S,
    verifier: &WebhookVerifier,
    uri: &str,
    body: &Value,
) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let raw = serde_json::to_vec(body).unwrap();
    let timestamp = Utc::now().timestamp();
    let msg_id = format!("msg_{}", Uuid::new_v4().simple());
    let signature = verifier.sign(&msg_id, timestamp, &raw).unwrap();

    let req = test::TestRequest::post()
        .uri(uri)
        .insert_header(("content-type", "application/json"))
        .insert_header(("webhook-id", msg_id))
        .insert_header(("webhook-timestamp", timestamp.to_string()))
        .insert_header(("webhook-signature", signature))
        .set_payload(raw)
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// POST a studio creation request with the service key.
pub async fn create_studio<S>(app: &S, key: Option<&str>, body: &Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut req = test::TestRequest::post().uri("/api/v1/studios").set_json(body);
    if let Some(key) = key {
        req = req.insert_header((SERVICE_KEY_HEADER, key));
    }

    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}
