//! Information facade: existence checks and listings.
//!
//! Listings are single ListObjects calls. "Files" below a path use the path
//! as both prefix and marker with a `/` delimiter, so only the objects one
//! level down come back and the directory placeholder itself is skipped.
//! "Directories" use prefix and delimiter only and return the common prefixes.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::{
    client::StorageClient,
    models::{
        listing::{DELIMITER, ListObjectsRequest, ObjectListing},
        stored_file::StoredFile,
    },
    services::error::BucketResult,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InformationService: Send + Sync {
    /// True when at least one key starts with `key`.
    async fn file_exists(&self, key: &str) -> BucketResult<bool>;

    async fn list_file_names(&self, path: &str) -> BucketResult<Vec<String>>;

    async fn list_files(&self, path: &str) -> BucketResult<Vec<StoredFile>>;

    /// Common prefixes one level below `path`, e.g. `photos/2025/`.
    async fn list_directories(&self, path: &str) -> BucketResult<Vec<String>>;
}

pub struct DefaultInformationService {
    client: Arc<dyn StorageClient>,
    bucket: String,
}

impl DefaultInformationService {
    pub fn new(client: Arc<dyn StorageClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    async fn list_file_objects(&self, path: &str) -> BucketResult<ObjectListing> {
        let request = ListObjectsRequest::new(&self.bucket, path)
            .with_marker(path)
            .with_delimiter(DELIMITER);
        let listing = self.client.list_objects(&request).await?;
        if listing.is_truncated {
            debug!(bucket = %self.bucket, path, "file listing truncated to first page");
        }
        Ok(listing)
    }
}

#[async_trait]
impl InformationService for DefaultInformationService {
    async fn file_exists(&self, key: &str) -> BucketResult<bool> {
        let listing = self
            .client
            .list_objects(&ListObjectsRequest::new(&self.bucket, key))
            .await?;
        Ok(!listing.object_summaries.is_empty())
    }

    async fn list_file_names(&self, path: &str) -> BucketResult<Vec<String>> {
        let listing = self.list_file_objects(path).await?;
        Ok(listing
            .object_summaries
            .into_iter()
            .map(|summary| summary.key)
            .collect())
    }

    async fn list_files(&self, path: &str) -> BucketResult<Vec<StoredFile>> {
        let listing = self.list_file_objects(path).await?;
        Ok(listing.object_summaries.iter().map(StoredFile::from).collect())
    }

    async fn list_directories(&self, path: &str) -> BucketResult<Vec<String>> {
        let request = ListObjectsRequest::new(&self.bucket, path).with_delimiter(DELIMITER);
        let listing = self.client.list_objects(&request).await?;
        Ok(listing.common_prefixes)
    }
}
