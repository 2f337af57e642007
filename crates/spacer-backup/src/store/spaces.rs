//! S3-compatible store client
//!
//! Works with DigitalOcean Spaces, Yandex Object Storage, MinIO and other
//! S3-compatible services reached through a custom endpoint.

use crate::error::StoreError;
use crate::store::ObjectStore;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region, RequestChecksumCalculation};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use spacer_core::{RemoteObject, StoreConfig};
use tracing::{debug, info};

/// Provider name attached to the static credentials
const CREDENTIALS_PROVIDER: &str = "spacer-static";

/// Store client over the S3 API
///
/// Holds one SDK client for authenticated calls and one HTTP client for
/// public fetches; both pool connections across cycles.
#[derive(Clone)]
pub struct SpacesStore {
    client: Client,
    http: reqwest::Client,
    bucket: String,
    endpoint: String,
    scheme: &'static str,
    force_path_style: bool,
}

impl SpacesStore {
    /// Build a client from explicit settings.
    ///
    /// Credentials are static; the SDK's default credential chain is never
    /// consulted.
    pub async fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.endpoint.is_empty() || config.bucket.is_empty() {
            return Err(StoreError::Client {
                message: "endpoint and bucket must be set".to_string(),
            });
        }
        if config.retry_limit == 0 {
            return Err(StoreError::Client {
                message: "retry limit must be at least 1".to_string(),
            });
        }

        let credentials = Credentials::new(
            config.credentials.access_key(),
            config.credentials.secret_key(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::standard().with_max_attempts(config.retry_limit))
            .load()
            .await;

        let endpoint_url = config.endpoint_url();
        debug!(
            "Using S3 endpoint {} (region {}, {} attempts)",
            endpoint_url, config.region, config.retry_limit
        );

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint_url)
            .force_path_style(config.force_path_style)
            // Many S3-compatible stores reject the flexible checksum headers
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Client {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client: Client::from_conf(s3_config),
            http,
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.clone(),
            scheme: config.scheme(),
            force_path_style: config.force_path_style,
        })
    }
}

#[async_trait]
impl ObjectStore for SpacesStore {
    fn object_url(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        if self.force_path_style {
            format!("{}://{}/{}/{}", self.scheme, self.endpoint, self.bucket, key)
        } else {
            format!("{}://{}.{}/{}", self.scheme, self.bucket, self.endpoint, key)
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String, StoreError> {
        let url = self.object_url(key);
        debug!(
            "Uploading {} bytes: s3://{}/{}",
            body.len(),
            self.bucket,
            key
        );

        let outcome = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await;

        match outcome {
            Ok(_) => {
                info!("Uploaded s3://{}/{}", self.bucket, key);
                Ok(url)
            }
            Err(e) => Err(StoreError::Put {
                key: key.to_string(),
                url,
                detail: DisplayErrorContext(&e).to_string(),
            }),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, StoreError> {
        debug!("Listing objects in s3://{}/{}", self.bucket, prefix);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let resp = request.send().await.map_err(|e| StoreError::List {
                prefix: prefix.to_string(),
                detail: DisplayErrorContext(&e).to_string(),
            })?;

            for object in resp.contents.unwrap_or_default() {
                let Some(key) = object.key else {
                    continue;
                };
                let last_modified = object
                    .last_modified
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
                    .unwrap_or(DateTime::UNIX_EPOCH);
                let size = object.size.unwrap_or(0).max(0) as u64;

                objects.push(RemoteObject::new(key, last_modified).with_size(size));
            }

            if resp.is_truncated == Some(true) && resp.next_continuation_token.is_some() {
                continuation_token = resp.next_continuation_token;
            } else {
                break;
            }
        }

        debug!("Found {} objects under {}", objects.len(), prefix);

        if objects.is_empty() {
            return Err(StoreError::NotFound {
                prefix: prefix.to_string(),
            });
        }
        Ok(objects)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.object_url(key);
        debug!("Fetching {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|source| StoreError::Fetch {
                url: url.clone(),
                source,
            })?;

        let body = response
            .bytes()
            .await
            .map_err(|source| StoreError::Fetch {
                url: url.clone(),
                source,
            })?;

        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

impl std::fmt::Debug for SpacesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpacesStore")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .finish_non_exhaustive()
    }
}
