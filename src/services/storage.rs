//! S3 storage for generated headshots.
//!
//! Supports both AWS S3 and MinIO for development.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use tracing::info;
use uuid::Uuid;

use crate::config::StorageSettings;
use crate::error::{AppError, AppResult};
use crate::models::ImageKind;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Object storage used by the image pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` under `key`, replacing any existing object.
    ///
    /// Returns the stored path, `{bucket}/{key}`.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> AppResult<String>;

    /// Public URL of a stored path.
    fn public_url(&self, path: &str) -> String;
}

/// S3 storage client wrapper.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3Storage {
    /// Create a new S3 storage client from configuration.
    pub async fn new(config: &StorageSettings) -> AppResult<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            config.secret_key.expose_secret(),
            None,
            None,
            "headshot-studio",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let storage = Self {
            client: Client::from_conf(s3_config_builder.build()),
            bucket: config.bucket.clone(),
            public_base: config.public_url.clone(),
        };

        storage.ensure_bucket_exists().await?;

        info!("S3 storage initialized: bucket={}", config.bucket);

        Ok(storage)
    }

    /// Ensure the bucket exists, creating it if necessary.
    async fn ensure_bucket_exists(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    info!("Creating S3 bucket '{}'", self.bucket);
                    self.client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await
                        .map_err(|e| {
                            AppError::Storage(format!("Failed to create bucket: {}", e))
                        })?;
                    Ok(())
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to access bucket '{}': {}",
                        self.bucket, service_error
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> AppResult<String> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        // PutObject overwrites an existing key.
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload {} to S3: {}", key, e)))?;

        Ok(format!("{}/{}", self.bucket, key))
    }

    fn public_url(&self, path: &str) -> String {
        public_url(&self.public_base, path)
    }
}

/// Build the object key for one stored image.
///
/// Format: `{yyyy-mm}/{job_id}/{results|previews}/{uuid}.jpg`. The random
/// suffix makes every call unique, so retried uploads never collide.
pub fn object_key(now: DateTime<Utc>, job_id: &str, kind: ImageKind) -> String {
    format!(
        "{}/{}/{}/{}.jpg",
        now.format("%Y-%m"),
        job_id,
        kind.as_str(),
        Uuid::new_v4()
    )
}

/// Public URL of a stored path under the storage base URL.
pub fn public_url(base: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
