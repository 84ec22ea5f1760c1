//! BucketService — groups the four facades for one bucket.
//!
//! Every facade is held as a trait object, so any of them can be swapped
//! for a test double without touching the others.

use std::sync::Arc;

use crate::{
    client::{S3StorageClient, StorageClient, s3_client::S3ClientConfig},
    services::{
        download_service::{DefaultDownloadService, DownloadService},
        error::BucketResult,
        information_service::{DefaultInformationService, InformationService},
        modification_service::{DefaultModificationService, ModificationService},
        upload_service::{DefaultUploadService, UploadService},
    },
};

#[derive(Clone)]
pub struct BucketService {
    bucket: String,
    upload: Arc<dyn UploadService>,
    download: Arc<dyn DownloadService>,
    information: Arc<dyn InformationService>,
    modification: Arc<dyn ModificationService>,
}

impl BucketService {
    /// Default facades sharing one client and bucket.
    pub fn new(client: Arc<dyn StorageClient>, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        Self {
            upload: Arc::new(DefaultUploadService::new(client.clone(), &bucket)),
            download: Arc::new(DefaultDownloadService::new(client.clone(), &bucket)),
            information: Arc::new(DefaultInformationService::new(client.clone(), &bucket)),
            modification: Arc::new(DefaultModificationService::new(client, &bucket)),
            bucket,
        }
    }

    pub fn from_parts(
        bucket: impl Into<String>,
        upload: Arc<dyn UploadService>,
        download: Arc<dyn DownloadService>,
        information: Arc<dyn InformationService>,
        modification: Arc<dyn ModificationService>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            upload,
            download,
            information,
            modification,
        }
    }

    /// Connect to S3 with `config` and build the default facades.
    pub async fn connect(bucket: impl Into<String>, config: &S3ClientConfig) -> BucketResult<Self> {
        let client = S3StorageClient::connect(config).await?;
        Ok(Self::new(Arc::new(client), bucket))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn upload_service(&self) -> Arc<dyn UploadService> {
        self.upload.clone()
    }

    pub fn download_service(&self) -> Arc<dyn DownloadService> {
        self.download.clone()
    }

    pub fn information_service(&self) -> Arc<dyn InformationService> {
        self.information.clone()
    }

    pub fn modification_service(&self) -> Arc<dyn ModificationService> {
        self.modification.clone()
    }
}
