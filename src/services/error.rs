use std::io;
use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum BucketError {
    /// Failure reported by the storage client, passed through unchanged.
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error("expiry of {0} minutes is out of range")]
    InvalidExpiry(i64),
}

impl BucketError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BucketError::Client(err) if err.is_not_found())
    }
}

pub type BucketResult<T> = Result<T, BucketError>;
