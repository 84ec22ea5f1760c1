//! Modification facade: delete and move.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    client::StorageClient,
    models::requests::CopyObjectRequest,
    services::error::BucketResult,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModificationService: Send + Sync {
    /// Delete `key`. Succeeds whether or not the key existed.
    async fn delete_file(&self, key: &str) -> BucketResult<()>;

    /// Server-side copy to `destination_key`, then delete `source_key`.
    ///
    /// Not atomic. If the delete fails the object exists under both keys.
    async fn move_file(&self, source_key: &str, destination_key: &str) -> BucketResult<()>;
}

pub struct DefaultModificationService {
    client: Arc<dyn StorageClient>,
    bucket: String,
}

impl DefaultModificationService {
    pub fn new(client: Arc<dyn StorageClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ModificationService for DefaultModificationService {
    async fn delete_file(&self, key: &str) -> BucketResult<()> {
        debug!(bucket = %self.bucket, key, "delete");
        self.client.delete_object(&self.bucket, key).await?;
        Ok(())
    }

    async fn move_file(&self, source_key: &str, destination_key: &str) -> BucketResult<()> {
        let request =
            CopyObjectRequest::new(&self.bucket, source_key, &self.bucket, destination_key);
        self.client.copy_object(&request).await?;

        if let Err(err) = self.delete_file(source_key).await {
            warn!(
                bucket = %self.bucket,
                source_key,
                destination_key,
                error = %err,
                "copied but could not delete source"
            );
            return Err(err);
        }
        debug!(bucket = %self.bucket, source_key, destination_key, "moved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, MockStorageClient};
    use mockall::{Sequence, predicate::eq};

    #[tokio::test]
    async fn delete_is_unconditional() {
        let mut client = MockStorageClient::new();
        client.expect_list_objects().never();
        client
            .expect_delete_object()
            .with(eq("media"), eq("old.txt"))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = DefaultModificationService::new(Arc::new(client), "media");
        service.delete_file("old.txt").await.unwrap();
    }

    #[tokio::test]
    async fn move_copies_then_deletes_source() {
        let mut seq = Sequence::new();
        let mut client = MockStorageClient::new();
        client
            .expect_copy_object()
            .withf(|req| *req == CopyObjectRequest::new("media", "in/a.txt", "media", "out/a.txt"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        client
            .expect_delete_object()
            .with(eq("media"), eq("in/a.txt"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let service = DefaultModificationService::new(Arc::new(client), "media");
        service.move_file("in/a.txt", "out/a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn failed_copy_skips_delete() {
        let mut client = MockStorageClient::new();
        client.expect_copy_object().times(1).returning(|req| {
            Err(ClientError::NotFound {
                bucket: req.source_bucket.clone(),
                key: req.source_key.clone(),
            })
        });
        client.expect_delete_object().never();

        let service = DefaultModificationService::new(Arc::new(client), "media");
        let err = service.move_file("in/a.txt", "out/a.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn failed_delete_is_reported_without_rollback() {
        let mut client = MockStorageClient::new();
        client.expect_copy_object().times(1).returning(|_| Ok(()));
        client.expect_delete_object().times(1).returning(|_, _| {
            Err(ClientError::sdk(std::io::Error::other("SlowDown")))
        });

        let service = DefaultModificationService::new(Arc::new(client), "media");
        let err = service.move_file("in/a.txt", "out/a.txt").await.unwrap_err();
        assert_eq!(err.to_string(), "SlowDown");
    }
}
