//! The seam between the facades and the object-storage SDK.
//!
//! `StorageClient` re-exposes exactly the SDK calls the facades need, with
//! SDK-neutral request and response values. `S3StorageClient` forwards to
//! `aws-sdk-s3`; `MemoryStorageClient` emulates a bucket in process.

pub mod memory_client;
pub mod s3_client;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::io;
use thiserror::Error;

use crate::models::{
    acl::AccessControlList,
    listing::{ListObjectsRequest, ObjectListing},
    requests::{CopyObjectRequest, PresignedUrlRequest, PutObjectRequest},
};

pub use memory_client::MemoryStorageClient;
pub use s3_client::S3StorageClient;

/// Object body as delivered by the store, chunk by chunk.
pub type ObjectStream = BoxStream<'static, io::Result<Bytes>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("object `{key}` not found in bucket `{bucket}`")]
    NotFound { bucket: String, key: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Anything the SDK reported, kept as-is.
    #[error(transparent)]
    Sdk(Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ClientError {
    pub fn sdk(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        ClientError::Sdk(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClientError::NotFound { .. } | ClientError::BucketNotFound(_)
        )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// One page of a ListObjects call.
    async fn list_objects(&self, request: &ListObjectsRequest) -> ClientResult<ObjectListing>;

    /// The bucket's ACL, `None` when the store reports no policy.
    async fn get_bucket_acl(&self, bucket: &str) -> ClientResult<Option<AccessControlList>>;

    async fn put_object(&self, request: &PutObjectRequest) -> ClientResult<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<ObjectStream>;

    async fn generate_presigned_url(&self, request: &PresignedUrlRequest) -> ClientResult<String>;

    async fn copy_object(&self, request: &CopyObjectRequest) -> ClientResult<()>;

    async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<()>;
}
