//! Headshot studio server - main entry point.
//!
//! Wires configuration, storage, the AI provider and the image pipeline
//! into the Actix-web server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tokio::sync::Semaphore;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use headshot_studio_lib::api;
use headshot_studio_lib::auth::{ServiceKey, WebhookVerifier};
use headshot_studio_lib::config::{Config, WebhookSecret};
use headshot_studio_lib::db::DbPool;
use headshot_studio_lib::middleware::RequestLogger;
use headshot_studio_lib::services::error_tracking::TrackingProvider;
use headshot_studio_lib::services::{
    BatchRunner, ErrorReporter, HttpTrackingProvider, RetryingFetcher, ReplicateClient,
    S3Storage, StudioService, TrackingReporter, WebhookDeps, WebhookDispatcher, ZeptoMailer,
};

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    error!("{}: {}", context, err);
    std::process::exit(1);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Docker HEALTHCHECK entry point
    if std::env::args().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if Config::from_env().is_ok() { 0 } else { 1 });
    }

    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, REPLICATE_API_TOKEN and");
            error!("    REPLICATE_WEBHOOK_SIGNING_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Headshot Studio Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = DbPool::new(&config)
        .await
        .unwrap_or_else(|e| fail("Failed to connect to database", e));
    pool.run_migrations()
        .await
        .unwrap_or_else(|e| fail("Failed to run migrations", e));
    info!("Database ready");

    let reporter: Arc<dyn ErrorReporter> = match &config.error_sink_url {
        Some(url) => {
            let provider = HttpTrackingProvider::new(url.clone())
                .unwrap_or_else(|e| fail("Failed to build error sink client", e));
            info!("Error tracking forwards to {}", url);
            let providers: Vec<Arc<dyn TrackingProvider>> = vec![Arc::new(provider)];
            Arc::new(TrackingReporter::with_providers(
                config.environment.to_string(),
                providers,
            ))
        }
        None => Arc::new(TrackingReporter::log_only(config.environment.to_string())),
    };

    let store = Arc::new(
        S3Storage::new(&config.storage)
            .await
            .unwrap_or_else(|e| fail("Failed to initialize storage", e)),
    );
    let fetcher = Arc::new(
        RetryingFetcher::new(config.pipeline.retry.clone(), reporter.clone())
            .unwrap_or_else(|e| fail("Failed to build image fetcher", e)),
    );
    let provider = Arc::new(
        ReplicateClient::new(&config.provider)
            .unwrap_or_else(|e| fail("Failed to build provider client", e)),
    );
    let mailer = Arc::new(
        ZeptoMailer::new(&config.email).unwrap_or_else(|e| fail("Failed to build mailer", e)),
    );

    // One ceiling for the whole process, shared by every delivery.
    let limiter = Arc::new(Semaphore::new(config.pipeline.concurrency));
    info!(
        "Pipeline: {} concurrent images, {}s deadline, {} fetch retries",
        config.pipeline.concurrency,
        config.pipeline.deadline.as_secs(),
        config.pipeline.retry.max_retries
    );

    let repository = Arc::new(pool.clone());

    let dispatcher = match &config.provider.webhook_secret {
        WebhookSecret::Configured(secret) => {
            let verifier = WebhookVerifier::new(secret)
                .unwrap_or_else(|e| fail("Invalid webhook signing secret", e));
            Some(web::Data::new(WebhookDispatcher::new(
                verifier,
                config.clone(),
                WebhookDeps {
                    studios: repository.clone(),
                    images: repository.clone(),
                    predictions: provider.clone(),
                    mailer,
                    reporter: reporter.clone(),
                    batch: BatchRunner::new(fetcher, store.clone(), limiter),
                },
            )))
        }
        WebhookSecret::Absent => {
            warn!("REPLICATE_WEBHOOK_SIGNING_SECRET not set - webhook routes are disabled");
            None
        }
    };

    let studios = web::Data::new(StudioService::new(
        config.clone(),
        repository.clone(),
        repository,
        provider,
        store,
        reporter,
    ));
    let service_key = web::Data::new(ServiceKey::new(config.service_api_key.clone()));
    let pool = web::Data::new(pool);

    let bind_address = config.bind_address();
    let worker_count = if config.is_development() {
        4
    } else {
        num_cpus::get()
    };
    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    HttpServer::new(move || {
        let mut scope = web::scope("/api/v1")
            .configure(api::configure_health_routes)
            .configure(api::configure_studio_routes);
        if let Some(dispatcher) = &dispatcher {
            scope = scope
                .app_data(dispatcher.clone())
                .configure(api::configure_webhook_routes);
        }

        App::new()
            .wrap(RequestLogger)
            .app_data(pool.clone())
            .app_data(studios.clone())
            .app_data(service_key.clone())
            .service(scope)
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
