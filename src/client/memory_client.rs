//! In-process `StorageClient` that behaves like a small S3 bucket.
//!
//! Objects live in a `BTreeMap` per bucket so listings come back in
//! lexicographic key order, the same order S3 uses. ETags are the quoted MD5
//! of the body, as S3 reports for single-part uploads. Used by the test
//! suite and by the `memory` backend of the service binary.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::debug;

use crate::client::{ClientError, ClientResult, ObjectStream, StorageClient};
use crate::models::{
    acl::AccessControlList,
    listing::{ListObjectsRequest, ObjectListing, ObjectSummary},
    requests::{CopyObjectRequest, PresignedUrlRequest, PutObjectRequest},
};

/// Page size of a single listing, as in S3.
pub const MAX_KEYS: usize = 1000;
const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Clone, Debug)]
struct MemoryObject {
    body: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
    acl: Option<AccessControlList>,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    acl: Option<AccessControlList>,
    objects: BTreeMap<String, MemoryObject>,
}

#[derive(Debug, Default)]
pub struct MemoryStorageClient {
    buckets: RwLock<HashMap<String, MemoryBucket>>,
}

impl MemoryStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket with no ACL.
    pub fn with_bucket(self, name: impl Into<String>) -> Self {
        self.write().entry(name.into()).or_default();
        self
    }

    /// Create (or reset the ACL of) a bucket.
    pub fn with_bucket_acl(self, name: impl Into<String>, acl: AccessControlList) -> Self {
        self.write().entry(name.into()).or_default().acl = Some(acl);
        self
    }

    /// Store bytes directly, bypassing the local filesystem.
    pub fn insert_object(&self, bucket: &str, key: &str, body: impl Into<Bytes>) -> ClientResult<()> {
        let body = body.into();
        let mut buckets = self.write();
        let bucket_rec = buckets
            .get_mut(bucket)
            .ok_or_else(|| ClientError::BucketNotFound(bucket.to_string()))?;
        bucket_rec
            .objects
            .insert(key.to_string(), MemoryObject::new(body, None));
        Ok(())
    }

    pub fn object_body(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.read()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|o| o.body.clone())
    }

    pub fn object_acl(&self, bucket: &str, key: &str) -> Option<AccessControlList> {
        self.read()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .and_then(|o| o.acl.clone())
    }

    /// All keys of a bucket in listing order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.read()
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, MemoryBucket>> {
        self.buckets.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, MemoryBucket>> {
        self.buckets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MemoryObject {
    fn new(body: Bytes, acl: Option<AccessControlList>) -> Self {
        let etag = format!("\"{:x}\"", md5::compute(&body));
        Self {
            body,
            etag,
            last_modified: Utc::now(),
            acl,
        }
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    async fn list_objects(&self, request: &ListObjectsRequest) -> ClientResult<ObjectListing> {
        let buckets = self.read();
        let bucket = buckets
            .get(&request.bucket)
            .ok_or_else(|| ClientError::BucketNotFound(request.bucket.clone()))?;

        let prefix = request.prefix.as_deref().unwrap_or("");
        let delimiter = request.delimiter.as_deref().filter(|d| !d.is_empty());

        let mut listing = ObjectListing {
            bucket_name: request.bucket.clone(),
            ..Default::default()
        };
        let mut last_entry: Option<String> = None;
        let mut count = 0;

        let candidates = bucket
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| match &request.marker {
                Some(marker) => key.as_str() > marker.as_str(),
                None => true,
            });
        for (key, object) in candidates {
            let common = delimiter.and_then(|d| compute_common_prefix(key, prefix, d));
            if let Some(common) = &common {
                if listing.common_prefixes.last() == Some(common) {
                    continue;
                }
            }
            if count == MAX_KEYS {
                listing.is_truncated = true;
                listing.next_marker = last_entry;
                break;
            }
            count += 1;
            match common {
                Some(common) => {
                    last_entry = Some(common.clone());
                    listing.common_prefixes.push(common);
                }
                None => {
                    last_entry = Some(key.clone());
                    listing.object_summaries.push(ObjectSummary {
                        bucket_name: request.bucket.clone(),
                        key: key.clone(),
                        etag: Some(object.etag.clone()),
                        size: object.body.len() as i64,
                        last_modified: Some(object.last_modified),
                    });
                }
            }
        }

        debug!(
            bucket = %request.bucket,
            prefix,
            objects = listing.object_summaries.len(),
            common_prefixes = listing.common_prefixes.len(),
            "memory list"
        );
        Ok(listing)
    }

    async fn get_bucket_acl(&self, bucket: &str) -> ClientResult<Option<AccessControlList>> {
        self.read()
            .get(bucket)
            .map(|b| b.acl.clone())
            .ok_or_else(|| ClientError::BucketNotFound(bucket.to_string()))
    }

    async fn put_object(&self, request: &PutObjectRequest) -> ClientResult<()> {
        let body = Bytes::from(tokio::fs::read(&request.file).await?);
        let mut buckets = self.write();
        let bucket = buckets
            .get_mut(&request.bucket)
            .ok_or_else(|| ClientError::BucketNotFound(request.bucket.clone()))?;
        debug!(bucket = %request.bucket, key = %request.key, size = body.len(), "memory put");
        bucket.objects.insert(
            request.key.clone(),
            MemoryObject::new(body, request.access_control_list.clone()),
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<ObjectStream> {
        let body = {
            let buckets = self.read();
            let bucket_rec = buckets
                .get(bucket)
                .ok_or_else(|| ClientError::BucketNotFound(bucket.to_string()))?;
            bucket_rec
                .objects
                .get(key)
                .map(|o| o.body.clone())
                .ok_or_else(|| ClientError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })?
        };

        let chunks: Vec<std::io::Result<Bytes>> = (0..body.len())
            .step_by(CHUNK_SIZE)
            .map(|start| Ok(body.slice(start..(start + CHUNK_SIZE).min(body.len()))))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn generate_presigned_url(&self, request: &PresignedUrlRequest) -> ClientResult<String> {
        if !self.read().contains_key(&request.bucket) {
            return Err(ClientError::BucketNotFound(request.bucket.clone()));
        }
        if request.expiration <= Utc::now() {
            return Err(ClientError::InvalidRequest(format!(
                "expiration {} is not in the future",
                request.expiration
            )));
        }
        Ok(format!(
            "memory://{}/{}?method={}&expires={}",
            request.bucket,
            urlencoding::encode(&request.key),
            request.method,
            request.expiration.timestamp()
        ))
    }

    async fn copy_object(&self, request: &CopyObjectRequest) -> ClientResult<()> {
        let mut buckets = self.write();
        let source = buckets
            .get(&request.source_bucket)
            .ok_or_else(|| ClientError::BucketNotFound(request.source_bucket.clone()))?
            .objects
            .get(&request.source_key)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                bucket: request.source_bucket.clone(),
                key: request.source_key.clone(),
            })?;
        // S3 refuses a copy onto itself that changes nothing.
        if request.source_bucket == request.destination_bucket
            && request.source_key == request.destination_key
        {
            return Err(ClientError::InvalidRequest(format!(
                "cannot copy `{}` onto itself",
                request.source_key
            )));
        }
        let destination = buckets
            .get_mut(&request.destination_bucket)
            .ok_or_else(|| ClientError::BucketNotFound(request.destination_bucket.clone()))?;
        debug!(
            source = %request.source_key,
            destination = %request.destination_key,
            "memory copy"
        );
        // A copy gets a fresh timestamp and, like S3, no ACL of its own.
        destination.objects.insert(
            request.destination_key.clone(),
            MemoryObject::new(source.body, None),
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        let mut buckets = self.write();
        let bucket_rec = buckets
            .get_mut(bucket)
            .ok_or_else(|| ClientError::BucketNotFound(bucket.to_string()))?;
        // Deleting a missing key succeeds, as it does against S3.
        if bucket_rec.objects.remove(key).is_none() {
            debug!(bucket, key, "memory delete of missing key");
        }
        Ok(())
    }
}

/// S3 "common prefix" of `key` below `prefix`, if the remainder contains the
/// delimiter. `photos/2025/img.jpg` under `photos/` yields `photos/2025/`.
fn compute_common_prefix(key: &str, prefix: &str, delimiter: &str) -> Option<String> {
    let after_prefix = key.strip_prefix(prefix)?;
    let pos = after_prefix.find(delimiter)?;
    let mut combined = String::with_capacity(prefix.len() + pos + delimiter.len());
    combined.push_str(prefix);
    combined.push_str(&after_prefix[..pos + delimiter.len()]);
    Some(combined)
}
