//! Blob storage for media files.
//!
//! [`BlobStore`] is the seam between the media pipelines and the cloud:
//! keys are always `/`-separated paths relative to the media namespace
//! (e.g. `products/teapot.jpg`); the S3 implementation maps them under the
//! configured prefix.

use std::future::Future;

use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::BlobConfig;

#[cfg(test)]
pub mod memory;

/// Errors from blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The storage service rejected or failed the request.
    #[error("storage request failed for '{key}': {message}")]
    Request {
        /// Key the request was about (empty for listings).
        key: String,
        /// Provider error, flattened for display.
        message: String,
    },
}

impl StorageError {
    fn request(key: &str, err: &impl std::error::Error) -> Self {
        Self::Request {
            key: key.to_owned(),
            message: DisplayErrorContext(err).to_string(),
        }
    }
}

/// An object in the blob namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    /// Key relative to the media namespace.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
}

/// Cloud object storage for media.
pub trait BlobStore: Send + Sync {
    /// List every object in the namespace.
    fn list(&self) -> impl Future<Output = Result<Vec<BlobObject>, StorageError>> + Send;

    /// Whether an object exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Store an object, replacing any existing one.
    fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Fetch an object's bytes.
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;

    /// Delete an object. Deleting a missing object succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// S3-compatible blob store (AWS S3, Cloudflare R2, `MinIO`, ...).
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3BlobStore {
    /// Build a client from configuration. No request is made until first use.
    #[must_use]
    pub fn new(config: &BlobConfig) -> Self {
        debug!(?config, "Initializing blob storage");

        let credentials = Credentials::new(
            &config.access_key,
            config.secret_key.expose_secret(),
            None,
            None,
            "emporium-media",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version_latest()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(bucket = %config.bucket, prefix = %config.prefix, "Blob storage client initialized");

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
        }
    }

    /// Bucket name, for logging.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.trim_start_matches('/'))
    }
}

impl BlobStore for S3BlobStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list(&self) -> Result<Vec<BlobObject>, StorageError> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&self.prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| StorageError::request(&self.prefix, &e))?;

            for object in response.contents() {
                let Some(full) = object.key() else { continue };
                let Some(key) = full.strip_prefix(self.prefix.as_str()) else {
                    continue;
                };
                // Directory placeholder objects
                if key.is_empty() || key.ends_with('/') {
                    continue;
                }
                objects.push(BlobObject {
                    key: key.to_owned(),
                    size: object
                        .size()
                        .and_then(|s| u64::try_from(s).ok())
                        .unwrap_or(0),
                });
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_owned());
                }
                _ => break,
            }
        }

        debug!(count = objects.len(), "Listed blob objects");
        Ok(objects)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_not_found() {
                    Ok(false)
                } else {
                    Err(StorageError::request(key, &service))
                }
            }
        }
    }

    #[instrument(skip(self, data), fields(bucket = %self.bucket, size = data.len()))]
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let checksum = sha256_hex(&data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .content_type(content_type)
            .metadata("sha256", &checksum)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::request(key, &e))?;

        info!(key, %checksum, "Uploaded blob");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_no_such_key() {
                    StorageError::NotFound(key.to_owned())
                } else {
                    StorageError::request(key, &service)
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::request(key, &e))?
            .into_bytes()
            .to_vec();

        debug!(key, size = data.len(), "Downloaded blob");
        Ok(data)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| StorageError::request(key, &e))?;

        info!(key, "Deleted blob");
        Ok(())
    }
}

/// Hex-encoded SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_config(prefix: &str) -> BlobConfig {
        BlobConfig {
            bucket: "shop-media".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some("http://localhost:9000".to_string()),
            access_key: "minio".to_string(),
            secret_key: SecretString::from("minio-secret"),
            prefix: prefix.to_string(),
            path_style: true,
        }
    }

    #[test]
    fn test_full_key_applies_prefix() {
        let store = S3BlobStore::new(&test_config("media/"));
        assert_eq!(store.full_key("products/a.jpg"), "media/products/a.jpg");
        assert_eq!(store.full_key("/b.png"), "media/b.png");
        assert_eq!(store.bucket(), "shop-media");

        let bare = S3BlobStore::new(&test_config(""));
        assert_eq!(bare.full_key("c.gif"), "c.gif");
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"Hello, World!"),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }
}
