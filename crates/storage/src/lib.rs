//! AWS S3 implementation of [`ObjectStorage`] for event photos.

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use mercuria_core::storage::{public_url, ObjectStorage, UploadError};
use mercuria_core::types::EntityId;

/// Connection settings for the photo bucket.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    pub endpoint: Option<String>,
    /// Base for public URLs; defaults to the bucket's virtual-hosted URL.
    pub public_base_url: Option<String>,
}

impl S3Config {
    /// Public base URL for objects in this bucket.
    pub fn resolved_base_url(&self) -> String {
        if let Some(base) = &self.public_base_url {
            return base.trim_end_matches('/').to_string();
        }
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

#[derive(Clone)]
pub struct S3ObjectStorage {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3ObjectStorage {
    /// Build a client from config. Static credentials are used when both
    /// key id and secret are set; otherwise the default AWS provider chain.
    pub async fn from_config(cfg: &S3Config) -> Self {
        let region = Region::new(cfg.region.clone());
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(RegionProviderChain::first_try(region.clone()));

        if let (Some(key_id), Some(secret)) = (&cfg.access_key_id, &cfg.secret_access_key) {
            let credentials = Credentials::new(
                key_id.clone(),
                secret.clone(),
                cfg.session_token.clone().filter(|s| !s.is_empty()),
                None,
                "static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }
        let shared = loader.load().await;

        let mut builder = S3ConfigBuilder::from(&shared).region(region);
        if let Some(endpoint) = &cfg.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: cfg.bucket.clone(),
            base_url: cfg.resolved_base_url(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(
        &self,
        data: Vec<u8>,
        object_id: EntityId,
        content_type: &str,
    ) -> Result<String, UploadError> {
        let key = object_id.to_string();
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key, "S3 put_object failed");
                UploadError::Backend(e.to_string())
            })?;

        tracing::debug!(key = %key, size, "Uploaded object");
        Ok(public_url(&self.base_url, &key))
    }
}
