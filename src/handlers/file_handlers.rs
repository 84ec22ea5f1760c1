//! HTTP handlers for file operations on the configured bucket.
//! Request and response bodies are streamed through scratch files so the
//! facades can keep working with local paths.

use crate::{errors::AppError, handlers::AppState, models::stored_file::StoredFile};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_PRESIGN_MINUTES: i64 = 15;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct PresignQuery {
    pub minutes: Option<i64>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Files,
    Names,
    Directories,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub kind: ListKind,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Serialize)]
pub struct PresignResponse {
    pub url: String,
    pub expires_in_minutes: i64,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListResponse {
    Files(Vec<StoredFile>),
    Names(Vec<String>),
}

/// PUT `/files/{*key}` — store the request body under `key`.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(q): Query<UploadQuery>,
    body: Body,
) -> Result<StatusCode, AppError> {
    let tmp_path = stage_body(&state, body).await?;

    let upload = state.service.upload_service();
    let result = if q.public {
        upload.upload_public_file(&tmp_path, &key).await
    } else {
        upload.upload_file(&tmp_path, &key).await
    };

    if let Err(err) = fs::remove_file(&tmp_path).await {
        warn!(path = %tmp_path.display(), error = %err, "could not remove staged upload");
    }
    result?;

    info!(key = %key, public = q.public, "uploaded");
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/files/{*key}` — download through the facade and stream the file back.
pub async fn download_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let staging = state.download_dir.join(Uuid::new_v4().to_string());
    let result = state
        .service
        .download_service()
        .download_file_to(&key, &staging)
        .await;
    let path = match result {
        Ok(path) => path,
        Err(err) => {
            match fs::remove_dir_all(&staging).await {
                Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                    warn!(path = %staging.display(), error = %cleanup, "could not remove staged download");
                }
                _ => {}
            }
            return Err(err.into());
        }
    };

    let file = File::open(&path).await?;
    let length = file.metadata().await?.len();
    // The open handle keeps the content readable after the unlink.
    if let Err(err) = fs::remove_dir_all(&staging).await {
        warn!(path = %staging.display(), error = %err, "could not remove staged download");
    }

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name)) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    Ok(response)
}

/// HEAD `/files/{*key}` — 200 when something exists under `key`, 404 otherwise.
pub async fn file_exists(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    let exists = state.service.information_service().file_exists(&key).await?;
    Ok(if exists {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    })
}

/// DELETE `/files/{*key}`
pub async fn delete_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .service
        .modification_service()
        .delete_file(&key)
        .await?;
    info!(key = %key, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/move` — copy `source` to `destination`, then delete `source`.
pub async fn move_file(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<StatusCode, AppError> {
    if req.source.is_empty() || req.destination.is_empty() {
        return Err(AppError::bad_request("source and destination are required"));
    }
    state
        .service
        .modification_service()
        .move_file(&req.source, &req.destination)
        .await?;
    info!(source = %req.source, destination = %req.destination, "moved");
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/presign/{*key}?minutes=` — temporary read URL.
pub async fn presign(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(q): Query<PresignQuery>,
) -> Result<impl IntoResponse, AppError> {
    let minutes = q.minutes.unwrap_or(DEFAULT_PRESIGN_MINUTES);
    let url = state
        .service
        .download_service()
        .create_presigned_url(&key, minutes)
        .await?;
    Ok(Json(PresignResponse {
        url,
        expires_in_minutes: minutes,
    }))
}

/// GET `/list?path=&kind=files|names|directories`
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let information = state.service.information_service();
    let body = match q.kind {
        ListKind::Files => ListResponse::Files(information.list_files(&q.path).await?),
        ListKind::Names => ListResponse::Names(information.list_file_names(&q.path).await?),
        ListKind::Directories => {
            ListResponse::Names(information.list_directories(&q.path).await?)
        }
    };
    Ok(Json(body))
}

/// Write a request body to a fresh file under `<download_dir>/.uploads/`.
async fn stage_body(state: &AppState, body: Body) -> Result<PathBuf, AppError> {
    let dir = state.download_dir.join(".uploads");
    fs::create_dir_all(&dir).await?;
    let tmp_path = dir.join(Uuid::new_v4().to_string());
    let mut file = File::create(&tmp_path).await?;

    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let written = match chunk {
            Ok(chunk) => file.write_all(&chunk).await,
            Err(err) => Err(io::Error::other(err)),
        };
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                warn!(path = %tmp_path.display(), error = %cleanup, "could not remove staged upload");
            }
            return Err(AppError::internal(format!("could not stage upload: {}", err)));
        }
    }
    file.flush().await?;
    Ok(tmp_path)
}
