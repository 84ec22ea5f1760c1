//! Download facade: object → local file, and presigned read URLs.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use futures::StreamExt;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};

use crate::{
    client::StorageClient,
    models::{
        requests::{HttpMethod, PresignedUrlRequest},
        stored_file::file_name,
    },
    services::error::{BucketError, BucketResult},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownloadService: Send + Sync {
    /// Download `key` into the working directory, named after the key's
    /// last path segment.
    async fn download_file(&self, key: &str) -> BucketResult<PathBuf>;

    /// Download `key` into `local_path`, creating missing directories.
    async fn download_file_to(&self, key: &str, local_path: &Path) -> BucketResult<PathBuf>;

    /// GET URL for `key` valid for `minutes` from now.
    async fn create_presigned_url(&self, key: &str, minutes: i64) -> BucketResult<String>;
}

pub struct DefaultDownloadService {
    client: Arc<dyn StorageClient>,
    bucket: String,
}

impl DefaultDownloadService {
    pub fn new(client: Arc<dyn StorageClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl DownloadService for DefaultDownloadService {
    async fn download_file(&self, key: &str) -> BucketResult<PathBuf> {
        self.download_file_to(key, Path::new("")).await
    }

    async fn download_file_to(&self, key: &str, local_path: &Path) -> BucketResult<PathBuf> {
        let target = local_file_path(key, local_path)?;
        let mut stream = self.client.get_object(&self.bucket, key).await?;

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut file = File::create(&target).await?;

        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let result = match chunk {
                Ok(chunk) => {
                    written += chunk.len() as u64;
                    file.write_all(&chunk).await
                }
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&target).await {
                    warn!(path = %target.display(), error = %cleanup, "could not remove partial download");
                }
                return Err(BucketError::Io(err));
            }
        }
        file.flush().await?;

        debug!(bucket = %self.bucket, key, path = %target.display(), bytes = written, "downloaded");
        Ok(target)
    }

    async fn create_presigned_url(&self, key: &str, minutes: i64) -> BucketResult<String> {
        let expiration = TimeDelta::try_minutes(minutes)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .ok_or(BucketError::InvalidExpiry(minutes))?;

        let request = PresignedUrlRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            method: HttpMethod::Get,
            expiration,
        };
        let url = self.client.generate_presigned_url(&request).await?;
        debug!(bucket = %self.bucket, key, %expiration, "presigned url created");
        Ok(url)
    }
}

/// `local_path` joined with the key's file name. Keys without a file name
/// (empty, or ending in `/`) can't be written to a file.
fn local_file_path(key: &str, local_path: &Path) -> BucketResult<PathBuf> {
    let name = file_name(key);
    if name.is_empty() || name == "." || name == ".." {
        return Err(BucketError::InvalidKey(key.to_string()));
    }
    Ok(local_path.join(name))
}
