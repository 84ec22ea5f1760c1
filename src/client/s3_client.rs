//! `StorageClient` backed by the AWS S3 SDK.
//!
//! Each method builds one SDK request from the domain request value and sends
//! it. Errors stay SDK errors (boxed in `ClientError::Sdk`) except the
//! `NoSuchBucket` and `NoSuchKey` codes, which become
//! `ClientError::BucketNotFound` and `ClientError::NotFound` so callers can
//! tell them apart without depending on SDK types.

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::Credentials,
    error::ProvideErrorMetadata,
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime as SmithyDateTime},
};
use chrono::{DateTime, Utc};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::client::{ClientError, ClientResult, ObjectStream, StorageClient};
use crate::models::{
    acl::{AccessControlList, Grant, Grantee, Owner, Permission},
    listing::{ListObjectsRequest, ObjectListing, ObjectSummary},
    requests::{CopyObjectRequest, HttpMethod, PresignedUrlRequest, PutObjectRequest},
};

const NO_SUCH_BUCKET: &str = "NoSuchBucket";
const NO_SUCH_KEY: &str = "NoSuchKey";

/// Region used when neither the caller nor the environment picks one.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Connection settings for the S3 client.
#[derive(Clone, Debug, Default)]
pub struct S3ClientConfig {
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack, ...).
    pub endpoint_url: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub force_path_style: bool,
}

#[derive(Clone, Debug)]
pub struct S3StorageClient {
    client: Client,
}

impl S3StorageClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build an SDK client from the default provider chain, overridden by
    /// whatever `config` sets explicitly.
    pub async fn connect(config: &S3ClientConfig) -> ClientResult<Self> {
        let region = config
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "bucket-service",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(ClientError::InvalidRequest(
                    "access key and secret key must be set together".into(),
                ));
            }
        }
        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();
        Ok(Self::new(Client::from_conf(s3_config)))
    }
}

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn list_objects(&self, request: &ListObjectsRequest) -> ClientResult<ObjectListing> {
        debug!(
            bucket = %request.bucket,
            prefix = ?request.prefix,
            marker = ?request.marker,
            delimiter = ?request.delimiter,
            "list objects"
        );
        let resp = self
            .client
            .list_objects()
            .bucket(&request.bucket)
            .set_prefix(request.prefix.clone())
            .set_marker(request.marker.clone())
            .set_delimiter(request.delimiter.clone())
            .send()
            .await
            .map_err(|err| map_sdk_error(err, &request.bucket, None))?;

        let bucket_name = resp.name().unwrap_or(&request.bucket).to_string();
        let object_summaries = resp
            .contents()
            .iter()
            .map(|obj| ObjectSummary {
                bucket_name: bucket_name.clone(),
                key: obj.key().unwrap_or_default().to_string(),
                etag: obj.e_tag().map(str::to_string),
                size: obj.size().unwrap_or_default(),
                last_modified: obj.last_modified().and_then(to_chrono),
            })
            .collect();
        let common_prefixes = resp
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix().map(str::to_string))
            .collect();

        Ok(ObjectListing {
            bucket_name,
            object_summaries,
            common_prefixes,
            is_truncated: resp.is_truncated().unwrap_or(false),
            next_marker: resp.next_marker().map(str::to_string),
        })
    }

    async fn get_bucket_acl(&self, bucket: &str) -> ClientResult<Option<AccessControlList>> {
        debug!(bucket, "get bucket acl");
        let resp = self
            .client
            .get_bucket_acl()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| map_sdk_error(err, bucket, None))?;

        let mut acl = AccessControlList::new();
        if let Some(owner) = resp.owner() {
            acl = acl.with_owner(Owner {
                id: owner.id().map(str::to_string),
                display_name: owner.display_name().map(str::to_string),
            });
        }
        for grant in resp.grants() {
            match convert_grant(grant) {
                Some(Grant {
                    grantee,
                    permission,
                }) => acl.grant_permission(grantee, permission),
                None => debug!(bucket, ?grant, "skipping unrecognised grant"),
            }
        }
        Ok(Some(acl))
    }

    async fn put_object(&self, request: &PutObjectRequest) -> ClientResult<()> {
        debug!(
            bucket = %request.bucket,
            key = %request.key,
            file = %request.file.display(),
            with_acl = request.access_control_list.is_some(),
            "put object"
        );
        // Surface a missing local file as a plain I/O error.
        tokio::fs::metadata(&request.file).await?;
        let body = ByteStream::from_path(&request.file)
            .await
            .map_err(ClientError::sdk)?;

        let mut put = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(body);
        if let Some(acl) = &request.access_control_list {
            put = put
                .set_grant_full_control(acl.grant_header(Permission::FullControl))
                .set_grant_read(acl.grant_header(Permission::Read))
                .set_grant_read_acp(acl.grant_header(Permission::ReadAcp))
                .set_grant_write_acp(acl.grant_header(Permission::WriteAcp));
        }
        put.send()
            .await
            .map_err(|err| map_sdk_error(err, &request.bucket, None))?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<ObjectStream> {
        debug!(bucket, key, "get object");
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(err, bucket, Some(key)))?;

        Ok(Box::pin(ReaderStream::new(resp.body.into_async_read())))
    }

    async fn generate_presigned_url(&self, request: &PresignedUrlRequest) -> ClientResult<String> {
        debug!(
            bucket = %request.bucket,
            key = %request.key,
            method = %request.method,
            expiration = %request.expiration,
            "presign"
        );
        let expires_in = (request.expiration - Utc::now()).to_std().map_err(|_| {
            ClientError::InvalidRequest(format!(
                "expiration {} is not in the future",
                request.expiration
            ))
        })?;
        let presigning = PresigningConfig::expires_in(expires_in).map_err(ClientError::sdk)?;

        let presigned = match request.method {
            HttpMethod::Get => self
                .client
                .get_object()
                .bucket(&request.bucket)
                .key(&request.key)
                .presigned(presigning)
                .await
                .map_err(ClientError::sdk)?,
        };

        Ok(presigned.uri().to_string())
    }

    async fn copy_object(&self, request: &CopyObjectRequest) -> ClientResult<()> {
        debug!(
            source_bucket = %request.source_bucket,
            source_key = %request.source_key,
            destination_bucket = %request.destination_bucket,
            destination_key = %request.destination_key,
            "copy object"
        );
        self.client
            .copy_object()
            .copy_source(copy_source(&request.source_bucket, &request.source_key))
            .bucket(&request.destination_bucket)
            .key(&request.destination_key)
            .send()
            .await
            // A missing key on copy is always the source.
            .map_err(|err| {
                map_sdk_error(err, &request.source_bucket, Some(&request.source_key))
            })?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        debug!(bucket, key, "delete object");
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(err, bucket, None))?;
        Ok(())
    }
}

/// Turn the S3 error codes callers branch on into typed variants. `key` is
/// `None` for calls where `NoSuchKey` can't mean a missing object.
fn map_sdk_error<E>(err: E, bucket: &str, key: Option<&str>) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match (err.code(), key) {
        (Some(NO_SUCH_BUCKET), _) => ClientError::BucketNotFound(bucket.to_string()),
        (Some(NO_SUCH_KEY), Some(key)) => ClientError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => ClientError::sdk(err),
    }
}

/// `x-amz-copy-source` value: `bucket/key` with the key URL-encoded.
fn copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, urlencoding::encode(key))
}

fn to_chrono(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn convert_grant(grant: &aws_sdk_s3::types::Grant) -> Option<Grant> {
    let permission = Permission::parse(grant.permission()?.as_str())?;
    let grantee = grant.grantee()?;
    let grantee = if let Some(uri) = grantee.uri() {
        Grantee::Group(uri.to_string())
    } else if let Some(id) = grantee.id() {
        Grantee::CanonicalUser(id.to_string())
    } else if let Some(email) = grantee.email_address() {
        Grantee::Email(email.to_string())
    } else {
        return None;
    };
    Some(Grant {
        grantee,
        permission,
    })
}
