//! Defines routes for all bucket file operations.
//!
//! ## Structure
//! - **File-level endpoints**
//!   - `PUT    /files/{*key}` — upload (`?public=true` grants public read)
//!   - `GET    /files/{*key}` — download
//!   - `HEAD   /files/{*key}` — existence check
//!   - `DELETE /files/{*key}` — delete
//!   - `GET    /presign/{*key}` — presigned read URL (`?minutes=`)
//!
//! - **Bucket-level endpoints**
//!   - `GET    /list` — listing (`?path=&kind=files|names|directories`)
//!   - `POST   /move` — move one key to another
//!
//! The wildcard `*key` allows nested keys like `photos/2025/img.jpg`.

use crate::handlers::{
    AppState,
    file_handlers::{delete_file, download_file, file_exists, list, move_file, presign, upload_file},
    health_handlers::{healthz, readyz},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Build and return the router for all bucket routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // File-level routes
        .route(
            "/files/{*key}",
            put(upload_file)
                .get(download_file)
                .head(file_exists)
                .delete(delete_file),
        )
        .route("/presign/{*key}", get(presign))
        // Bucket-level routes
        .route("/list", get(list))
        .route("/move", post(move_file))
}
