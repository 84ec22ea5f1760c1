pub mod file_handlers;
pub mod health_handlers;

use std::path::PathBuf;

use crate::services::BucketService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: BucketService,
    /// Scratch space for request bodies and downloads on their way out.
    pub download_dir: PathBuf,
}

impl AppState {
    pub fn new(service: BucketService, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            download_dir: download_dir.into(),
        }
    }
}
