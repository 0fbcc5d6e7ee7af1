//! MinIO/S3-compatible storage client
//!
//! Uses rust-s3 with path-style addressing. Locators handed out are
//! `{public_endpoint}/{bucket}/{key}` URLs.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::{ObjectStorage, StorageError};
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
}

impl MinIOClient {
    /// Create the client and make sure the bucket exists
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // http://endpoint/bucket instead of http://bucket.endpoint
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
        };

        client.ensure_bucket_exists().await;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}",
            client.endpoint,
            client.bucket.name()
        );

        Ok(client)
    }

    async fn ensure_bucket_exists(&self) {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => info!("Bucket '{}' created", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    fn locator_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    /// Object key behind a locator issued by this client (public or internal endpoint)
    fn key_from_locator(&self, locator: &str) -> Option<String> {
        let bucket = self.bucket.name();
        [&self.public_endpoint, &self.endpoint]
            .into_iter()
            .find_map(|endpoint| {
                locator
                    .strip_prefix(&format!("{}/{}/", endpoint, bucket))
                    .map(str::to_string)
            })
    }
}

fn is_not_found(error: &str) -> bool {
    error.contains("404") || error.contains("NoSuchKey")
}

#[async_trait]
impl ObjectStorage for MinIOClient {
    async fn put(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(path, &data, content_type)
            .await
            .map_err(|e| StorageError::Failed(format!("upload of '{}' failed: {}", path, e)))?;

        if !(200..300).contains(&response.status_code()) {
            return Err(StorageError::Failed(format!(
                "upload of '{}' returned HTTP {}",
                path,
                response.status_code()
            )));
        }

        debug!("Uploaded '{}' to bucket '{}'", path, self.bucket.name());
        Ok(self.locator_for(path))
    }

    async fn delete(&self, locator: &str) -> Result<(), StorageError> {
        let key = self
            .key_from_locator(locator)
            .ok_or_else(|| StorageError::ForeignLocator(locator.to_string()))?;

        match self.bucket.delete_object(&key).await {
            Ok(response) if response.status_code() == 404 => {
                debug!("Object '{}' already gone", key);
                Ok(())
            }
            Ok(_) => {
                debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
                Ok(())
            }
            Err(e) if is_not_found(&e.to_string()) => {
                debug!("Object '{}' already gone", key);
                Ok(())
            }
            Err(e) => Err(StorageError::Failed(format!(
                "delete of '{}' failed: {}",
                key, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found("Got HTTP 404 with content 'NoSuchKey'"));
        assert!(is_not_found("NoSuchKey"));
        assert!(!is_not_found("Got HTTP 500"));
    }
}
