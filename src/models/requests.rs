//! Request values handed to a `StorageClient`.

use chrono::{DateTime, Utc};
use std::{fmt, path::PathBuf};

use crate::models::acl::AccessControlList;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    /// Local file whose bytes become the object body.
    pub file: PathBuf,
    pub access_control_list: Option<AccessControlList>,
}

impl PutObjectRequest {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            file: file.into(),
            access_control_list: None,
        }
    }

    pub fn with_access_control_list(mut self, acl: AccessControlList) -> Self {
        self.access_control_list = Some(acl);
        self
    }
}

/// Server-side copy. Source and destination may live in different buckets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyObjectRequest {
    pub source_bucket: String,
    pub source_key: String,
    pub destination_bucket: String,
    pub destination_key: String,
}

impl CopyObjectRequest {
    pub fn new(
        source_bucket: impl Into<String>,
        source_key: impl Into<String>,
        destination_bucket: impl Into<String>,
        destination_key: impl Into<String>,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            source_key: source_key.into(),
            destination_bucket: destination_bucket.into(),
            destination_key: destination_key.into(),
        }
    }
}

/// Presigned URLs are only handed out for reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresignedUrlRequest {
    pub bucket: String,
    pub key: String,
    pub method: HttpMethod,
    /// Absolute point in time after which the URL stops working.
    pub expiration: DateTime<Utc>,
}
