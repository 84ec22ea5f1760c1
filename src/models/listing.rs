//! Listing request and response shapes (S3 ListObjects, version 1).

use chrono::{DateTime, Utc};

/// Delimiter used for every "directory" aware listing.
pub const DELIMITER: &str = "/";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    /// Results start strictly after this key.
    pub marker: Option<String>,
    pub delimiter: Option<String>,
}

impl ListObjectsRequest {
    /// Plain prefix listing, no marker and no delimiter.
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: Some(prefix.into()),
            marker: None,
            delimiter: None,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }
}

/// One object entry of a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub bucket_name: String,
    pub key: String,
    pub etag: Option<String>,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A single page of listing results, in the order the store returned them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub bucket_name: String,
    pub object_summaries: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
}
