use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{client::ClientError, services::BucketError};

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<BucketError> for AppError {
    fn from(err: BucketError) -> Self {
        match &err {
            BucketError::Client(ClientError::NotFound { .. } | ClientError::BucketNotFound(_)) => {
                AppError::not_found(err.to_string())
            }
            BucketError::Client(ClientError::InvalidRequest(_))
            | BucketError::InvalidKey(_)
            | BucketError::InvalidExpiry(_) => AppError::bad_request(err.to_string()),
            _ => {
                tracing::error!(error = %err, "bucket operation failed");
                AppError::internal(err.to_string())
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_errors_map_to_status_codes() {
        let not_found = AppError::from(BucketError::Client(ClientError::NotFound {
            bucket: "media".into(),
            key: "a.txt".into(),
        }));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, "object `a.txt` not found in bucket `media`");

        let invalid = AppError::from(BucketError::InvalidKey("dir/".into()));
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let sdk = AppError::from(BucketError::Client(ClientError::sdk(
            std::io::Error::other("timeout"),
        )));
        assert_eq!(sdk.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(sdk.message, "timeout");
    }

    #[tokio::test]
    async fn response_body_is_json() {
        let response = AppError::not_found("missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "missing");
        assert_eq!(body["status"], 404);
    }
}
