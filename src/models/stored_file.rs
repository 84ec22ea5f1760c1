//! Represents an object (file) listed from a bucket.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::listing::ObjectSummary;

/// Read-only snapshot of a single object's metadata, taken from a listing.
///
/// Identity is `(bucket_name, key)`. Fields are private so the record can't
/// drift from the listing it was copied from.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    bucket_name: String,
    key: String,
    etag: Option<String>,
    size: i64,
    last_modified: Option<DateTime<Utc>>,
}

impl StoredFile {
    pub fn new(
        bucket_name: impl Into<String>,
        key: impl Into<String>,
        etag: Option<String>,
        size: i64,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            key: key.into(),
            etag,
            size,
            last_modified,
        }
    }

    /// Bucket the object lives in.
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Object key (path-like identifier within the bucket).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Content hash reported by the store, quotes included as returned.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Size in bytes.
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }
}

impl From<&ObjectSummary> for StoredFile {
    fn from(summary: &ObjectSummary) -> Self {
        Self::new(
            summary.bucket_name.clone(),
            summary.key.clone(),
            summary.etag.clone(),
            summary.size,
            summary.last_modified,
        )
    }
}

/// Everything after the last `/` of a key. Empty when the key ends in `/`.
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
