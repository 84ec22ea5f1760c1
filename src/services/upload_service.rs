//! Upload facade: local file → object.

use async_trait::async_trait;
use std::{path::Path, sync::Arc};
use tracing::debug;

use crate::{
    client::StorageClient,
    models::{
        acl::{AccessControlList, GroupGrantee, Permission},
        requests::PutObjectRequest,
    },
    services::error::BucketResult,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Store `file` under `key` with the bucket's default (private) access.
    async fn upload_file(&self, file: &Path, key: &str) -> BucketResult<()>;

    /// Store `file` under `key`, readable by everyone.
    async fn upload_public_file(&self, file: &Path, key: &str) -> BucketResult<()>;
}

pub struct DefaultUploadService {
    client: Arc<dyn StorageClient>,
    bucket: String,
}

impl DefaultUploadService {
    pub fn new(client: Arc<dyn StorageClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    async fn put(&self, file: &Path, key: &str, acl: Option<AccessControlList>) -> BucketResult<()> {
        let mut request = PutObjectRequest::new(&self.bucket, key, file);
        if let Some(acl) = acl {
            request = request.with_access_control_list(acl);
        }
        self.client.put_object(&request).await?;
        Ok(())
    }

    /// The bucket's ACL, or an empty one when the store reports none.
    async fn bucket_acl(&self) -> BucketResult<AccessControlList> {
        Ok(self
            .client
            .get_bucket_acl(&self.bucket)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl UploadService for DefaultUploadService {
    async fn upload_file(&self, file: &Path, key: &str) -> BucketResult<()> {
        debug!(bucket = %self.bucket, key, "upload private file");
        self.put(file, key, None).await
    }

    async fn upload_public_file(&self, file: &Path, key: &str) -> BucketResult<()> {
        debug!(bucket = %self.bucket, key, "upload public file");
        let mut acl = self.bucket_acl().await?;
        acl.grant_permission(GroupGrantee::AllUsers, Permission::Read);
        self.put(file, key, Some(acl)).await
    }
}
