use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

/// StorageService
///
/// Abstract contract for the object-storage layer holding the portal's uploaded
/// media: guest ID-card photos and patrol checkpoint photos. The concrete S3
/// client is swapped for the in-memory mock in tests without touching handlers.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup to
    /// automatically provision the bucket in MinIO. No-op in production.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary, cryptographically signed URL allowing a client to
    /// upload a file directly to the bucket, constrained by expiration time and
    /// content type.
    ///
    /// # Arguments
    /// * `key`: The final object key (e.g. `guest-ids/<uuid>.jpg`).
    /// * `content_type`: The expected MIME type (e.g. "image/jpeg").
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String>;
}

/// S3StorageClient
///
/// Concrete implementation over the AWS SDK. S3 compatibility lets the same
/// client talk to the Dockerized MinIO instance locally and the managed storage
/// gateway in production; `force_path_style(true)` is required for both.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    /// Constructs the client from the resolved application configuration.
    pub async fn from_config(config: &AppConfig) -> Self {
        let credentials = s3::config::Credentials::new(
            config.s3_key.as_str(),
            config.s3_secret.as_str(),
            None,
            None,
            "static",
        );

        let s3_config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(config.s3_endpoint.as_str())
            .region(s3::config::Region::new(config.s3_region.clone()))
            .behavior_version_latest()
            // Path-style addressing (http://endpoint/bucket/key) is required for
            // MinIO and for provider storage gateways.
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(s3_config),
            bucket_name: config.s3_bucket.clone(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// Calls the S3 CreateBucket API. The call is idempotent, so it is safe to
    /// run at every startup.
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        // Expiration constrained to 10 minutes.
        let expires_in = Duration::from_secs(600);

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // The signed URL only accepts uploads carrying this Content-Type.
            .content_type(content_type)
            .presigned(
                PresigningConfig::expires_in(expires_in)
                    .map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }
}

/// sanitize_key
///
/// Strips directory-navigation components (`..`, `.`) from a user-provided key
/// segment before it is echoed back in mock URLs.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// In-memory implementation for unit and integration tests: exercises the
/// presigned-URL handler without a network connection.
#[derive(Clone)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        let sanitized_key = sanitize_key(key);

        // Deterministic, local-style URL for mock assertions.
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitized_key
        ))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service access across the application state.
pub type StorageState = Arc<dyn StorageService>;
